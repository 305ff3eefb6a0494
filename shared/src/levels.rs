use std::collections::HashMap;

/// Level at or above which a creature gets boss styling.
pub const BOSS_LEVEL: i64 = 105;

/// Creature level lookup, keyed by trimmed lowercase name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonsterLevels {
    levels: HashMap<String, i64>,
}

pub fn normalize_monster_name(name: &str) -> String {
    name.trim().to_lowercase()
}

impl MonsterLevels {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        let levels = pairs
            .into_iter()
            .filter_map(|(name, level)| {
                let key = normalize_monster_name(name.as_ref());
                (!key.is_empty()).then_some((key, level))
            })
            .collect();
        Self { levels }
    }

    pub fn level(&self, name: &str) -> Option<i64> {
        self.levels.get(&normalize_monster_name(name)).copied()
    }

    pub fn is_boss(&self, name: &str, boss_level: i64) -> bool {
        self.level(name).is_some_and(|level| level >= boss_level)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case_and_padding() {
        let levels = MonsterLevels::from_pairs([("  Ancient Golem ", 120), ("Slime", 2)]);
        assert_eq!(levels.level("ancient golem"), Some(120));
        assert_eq!(levels.level("SLIME"), Some(2));
        assert_eq!(levels.level("Wolf"), None);
    }

    #[test]
    fn boss_threshold_is_inclusive() {
        let levels = MonsterLevels::from_pairs([("Edge", BOSS_LEVEL), ("Below", BOSS_LEVEL - 1)]);
        assert!(levels.is_boss("Edge", BOSS_LEVEL));
        assert!(!levels.is_boss("Below", BOSS_LEVEL));
        assert!(!levels.is_boss("Unknown", BOSS_LEVEL));
    }

    #[test]
    fn blank_names_are_dropped() {
        let levels = MonsterLevels::from_pairs([("   ", 50)]);
        assert!(levels.is_empty());
    }
}
