use anyhow::{Result, bail};
use std::collections::HashMap;

use super::course::Tier;

const DEFAULT_SEED: u64 = 1337;

/// Seed metadata used for course generation and report labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
    pub source_tier: Option<Tier>,
}

impl SeedInfo {
    #[must_use]
    pub fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            code: None,
            source_tier: None,
        }
    }

    #[must_use]
    pub fn from_course_code(seed: u64, tier: Tier, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
            source_tier: Some(tier),
        }
    }

    /// Numeric seeds run on every tier; course codes only on their own.
    #[must_use]
    pub fn matches_tier(&self, tier: Tier) -> bool {
        self.source_tier.is_none_or(|source| source == tier)
    }

    #[must_use]
    pub fn code_for_tier(&self, tier: Tier) -> String {
        if let (Some(code), Some(source)) = (&self.code, self.source_tier)
            && source == tier
        {
            return code.clone();
        }
        encode_course_code(tier, self.seed)
    }
}

/// `GC-<TIER>-<seed>`
#[must_use]
pub fn encode_course_code(tier: Tier, seed: u64) -> String {
    format!("GC-{}-{seed}", tier.code())
}

#[must_use]
pub fn parse_course_code(token: &str) -> Option<(Tier, u64)> {
    let mut parts = token.trim().splitn(3, '-');
    let prefix = parts.next()?;
    if !prefix.eq_ignore_ascii_case("GC") {
        return None;
    }
    let tier = Tier::parse(parts.next()?)?;
    let seed = parts.next()?.parse::<u64>().ok()?;
    Some((tier, seed))
}

/// Resolve CLI seed tokens: plain integers (negative ones are mirrored) and
/// course codes. Duplicates collapse, preferring the coded form.
///
/// # Errors
///
/// Fails on a token that is neither.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some((tier, seed)) = parse_course_code(token) {
            pending.push(SeedInfo::from_course_code(
                seed,
                tier,
                encode_course_code(tier, seed),
            ));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<(u64, Option<Tier>), usize> = HashMap::new();

    for info in pending {
        let key = (info.seed, info.source_tier);
        if let Some(&existing) = index.get(&key) {
            if let Some(entry) = deduped.get_mut(existing)
                && entry.code.is_none()
                && info.code.is_some()
            {
                *entry = info;
            }
        } else {
            index.insert(key, deduped.len());
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }

    Ok(deduped)
}
