//! Levels decoded from latent vectors by an external generator.
use std::io::{BufRead, Write};

use log::{debug, trace};
use thiserror::Error;

/// Line the generator prints once it is ready to take vectors.
pub const READY_LINE: &str = "READY";
/// Line that asks the generator to exit.
pub const SHUTDOWN_LINE: &str = "0";

#[derive(Debug, Error)]
pub enum LevelSourceError {
    #[error("level source closed while waiting for {0}")]
    Closed(&'static str),
    #[error("latent coordinate {index} is not finite")]
    NonFiniteLatent { index: usize },
    #[error("could not parse level reply: {0}")]
    Parse(String),
    #[error("level source I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything that can turn a latent vector into a playable level.
pub trait LevelSource {
    type Level;

    /// # Errors
    ///
    /// Returns a [`LevelSourceError`] when no level can be produced.
    fn decode_level(&mut self, latent: &[f64]) -> Result<Self::Level, LevelSourceError>;
}

/// Squash `x` into (-1, 1).
#[must_use]
pub fn map_to_unit(x: f64) -> f64 {
    x / (1.0 + x * x).sqrt()
}

#[must_use]
pub fn map_slice_to_unit(latent: &[f64]) -> Vec<f64> {
    latent.iter().copied().map(map_to_unit).collect()
}

/// Client for a generator speaking one request line / one reply line.
///
/// The generator prints arbitrary start-up chatter followed by [`READY_LINE`].
/// Each request is a batch holding one comma-separated vector, `[[v0, v1]]`;
/// each reply is a single line handed to `parse`.
pub struct LineLevelSource<R, W, P> {
    reader: R,
    writer: W,
    parse: P,
    ready: bool,
}

impl<R: BufRead, W: Write, P> LineLevelSource<R, W, P> {
    pub fn new(reader: R, writer: W, parse: P) -> Self {
        Self {
            reader,
            writer,
            parse,
            ready: false,
        }
    }

    /// Consume start-up output up to and including the ready line. Only the
    /// first call reads anything.
    ///
    /// # Errors
    ///
    /// [`LevelSourceError::Closed`] if the stream ends first.
    pub fn await_ready(&mut self) -> Result<(), LevelSourceError> {
        if self.ready {
            return Ok(());
        }
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(LevelSourceError::Closed("the ready line"));
            }
            let trimmed = line.trim();
            if trimmed == READY_LINE {
                debug!("level source ready");
                self.ready = true;
                return Ok(());
            }
            debug!("level source: {trimmed}");
        }
    }

    /// Ask the generator to exit.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn shutdown(mut self) -> Result<(), LevelSourceError> {
        writeln!(self.writer, "{SHUTDOWN_LINE}")?;
        self.writer.flush()?;
        Ok(())
    }

    fn request(&mut self, latent: &[f64]) -> Result<String, LevelSourceError> {
        if let Some(index) = latent.iter().position(|value| !value.is_finite()) {
            return Err(LevelSourceError::NonFiniteLatent { index });
        }
        self.await_ready()?;

        let encoded = latent
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        // the generator takes a batch of vectors; this is a batch of one
        writeln!(self.writer, "[[{encoded}]]")?;
        self.writer.flush()?;
        trace!("sent latent vector of {} values", latent.len());

        let mut reply = String::new();
        if self.reader.read_line(&mut reply)? == 0 {
            return Err(LevelSourceError::Closed("a level reply"));
        }
        Ok(reply.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R, W, P, L> LevelSource for LineLevelSource<R, W, P>
where
    R: BufRead,
    W: Write,
    P: FnMut(&str) -> Result<L, LevelSourceError>,
{
    type Level = L;

    fn decode_level(&mut self, latent: &[f64]) -> Result<L, LevelSourceError> {
        let reply = self.request(latent)?;
        (self.parse)(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn passthrough(line: &str) -> Result<String, LevelSourceError> {
        Ok(line.to_string())
    }

    #[test]
    fn unit_mapping_is_odd_and_bounded() {
        assert_eq!(map_to_unit(0.0), 0.0);
        assert!((map_to_unit(1.0) - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
        assert_eq!(map_to_unit(-3.0), -map_to_unit(3.0));
        assert!(map_to_unit(1e9) < 1.0);
    }

    #[test]
    fn handshake_then_one_reply_per_request() {
        let input = Cursor::new("loading model\nwarming up\nREADY\n[[1,2]]\n[[3]]\n");
        let mut sent = Vec::new();
        let mut source = LineLevelSource::new(input, &mut sent, passthrough);

        assert_eq!(source.decode_level(&[0.5, -0.25]).unwrap(), "[[1,2]]");
        assert_eq!(source.decode_level(&[1.0]).unwrap(), "[[3]]");
        source.shutdown().unwrap();

        assert_eq!(
            String::from_utf8(sent).unwrap(),
            "[[0.5, -0.25]]\n[[1]]\n0\n"
        );
    }

    #[test]
    fn stream_ending_before_ready_is_closed() {
        let mut sent = Vec::new();
        let mut source = LineLevelSource::new(Cursor::new("booting\n"), &mut sent, passthrough);
        assert!(matches!(
            source.decode_level(&[0.0]),
            Err(LevelSourceError::Closed(_))
        ));
    }

    #[test]
    fn non_finite_latent_is_rejected_before_sending() {
        let mut sent = Vec::new();
        let mut source = LineLevelSource::new(Cursor::new("READY\n"), &mut sent, passthrough);
        assert!(matches!(
            source.decode_level(&[0.0, f64::NAN]),
            Err(LevelSourceError::NonFiniteLatent { index: 1 })
        ));
        drop(source);
        assert!(sent.is_empty());
    }
}
