//! Key ordering shared by the aggregators.

use crate::errors::ConfigError;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Order in which buffered keys are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// First-seen order.
    #[default]
    None,
    /// Ascending.
    Ascend,
    /// Descending.
    Descend,
    /// Ascending, ignoring case.
    AscendNoCase,
    /// Descending, ignoring case.
    DescendNoCase,
}

impl SortOrder {
    /// Compares two keys in this order.
    ///
    /// Numeric-looking keys sort before text keys and compare numerically;
    /// text keys compare as strings. `None` treats every pair as equal so a
    /// stable sort keeps arrival order.
    #[must_use]
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        let ascending = match self {
            Self::None => return Ordering::Equal,
            Self::Ascend | Self::Descend => compare_keys(a, b, false),
            Self::AscendNoCase | Self::DescendNoCase => compare_keys(a, b, true),
        };
        match self {
            Self::Descend | Self::DescendNoCase => ascending.reverse(),
            _ => ascending,
        }
    }
}

fn compare_keys(a: &str, b: &str, ignore_case: bool) -> Ordering {
    match (numeric_key(a), numeric_key(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) if ignore_case => a.to_lowercase().cmp(&b.to_lowercase()),
        (None, None) => a.cmp(b),
    }
}

fn numeric_key(key: &str) -> Option<f64> {
    key.trim().parse::<f64>().ok()
}

impl FromStr for SortOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "ascend" | "ascending" | "asc" => Ok(Self::Ascend),
            "descend" | "descending" | "desc" => Ok(Self::Descend),
            "ascendnocase" => Ok(Self::AscendNoCase),
            "descendnocase" => Ok(Self::DescendNoCase),
            _ => Err(ConfigError::invalid(
                "aggregator",
                "Sort",
                format!("unknown sort order '{s}'"),
            )),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Ascend => "Ascend",
            Self::Descend => "Descend",
            Self::AscendNoCase => "AscendNoCase",
            Self::DescendNoCase => "DescendNoCase",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("ascend".parse::<SortOrder>().unwrap(), SortOrder::Ascend);
        assert_eq!("DescendNoCase".parse::<SortOrder>().unwrap(), SortOrder::DescendNoCase);
        assert_eq!("".parse::<SortOrder>().unwrap(), SortOrder::None);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_numeric_keys_compare_numerically() {
        assert_eq!(SortOrder::Ascend.compare("9", "10"), Ordering::Less);
        assert_eq!(SortOrder::Descend.compare("9", "10"), Ordering::Greater);
        assert_eq!(SortOrder::Ascend.compare("b", "a"), Ordering::Greater);
    }

    #[test]
    fn test_case_handling() {
        assert_eq!(SortOrder::Ascend.compare("a", "B"), Ordering::Greater);
        assert_eq!(SortOrder::AscendNoCase.compare("a", "B"), Ordering::Less);
        assert_eq!(SortOrder::DescendNoCase.compare("a", "B"), Ordering::Greater);
        assert_eq!(SortOrder::None.compare("z", "a"), Ordering::Equal);
    }

    #[test]
    fn test_mixed_keys_rank_numbers_before_text() {
        assert_eq!(SortOrder::Ascend.compare("10", "1a"), Ordering::Less);
        assert_eq!(SortOrder::Ascend.compare("1a", "2"), Ordering::Greater);
        assert_eq!(SortOrder::Ascend.compare("2", "10"), Ordering::Less);
        assert_eq!(SortOrder::Descend.compare("10", "1a"), Ordering::Greater);
    }

    #[test]
    fn test_mixed_keys_sort_without_panicking() {
        let mut keys: Vec<String> = (0..400)
            .map(|x| if x % 3 == 0 { format!("{x}a") } else { x.to_string() })
            .rev()
            .collect();
        keys.sort_by(|a, b| SortOrder::Ascend.compare(a, b));

        let first_text = keys.iter().position(|k| k.ends_with('a')).unwrap();
        assert!(keys[..first_text].iter().all(|k| k.parse::<f64>().is_ok()));
        assert!(keys[first_text..].iter().all(|k| k.ends_with('a')));
        assert!(keys[..first_text]
            .windows(2)
            .all(|w| w[0].parse::<f64>().unwrap() <= w[1].parse::<f64>().unwrap()));
    }
}
