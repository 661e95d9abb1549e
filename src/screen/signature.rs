use serde::{Deserialize, Serialize};

use crate::driver::driver::{AutomationDriver, ElementRef};

/// Token separator in the class-hierarchy string.
pub const SEPARATOR: char = ';';

/// How the truncated class-hierarchy string is stored as the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureStrategy {
    /// Keep the class string itself (readable in logs)
    #[default]
    Raw,
    /// Hex SHA-1 of the class string (fixed width)
    Sha1,
}

impl std::str::FromStr for SignatureStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(SignatureStrategy::Raw),
            "sha1" => Ok(SignatureStrategy::Sha1),
            other => Err(format!("unknown signature strategy '{}' (expected raw or sha1)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureConfig {
    /// Maximum length of the class-hierarchy string, in characters
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    #[serde(default)]
    pub strategy: SignatureStrategy,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            strategy: SignatureStrategy::Raw,
        }
    }
}

fn default_max_length() -> usize {
    160
}

/// Class name without its namespace: `android.widget.Button` -> `Button`.
pub fn leaf_class_name(class_name: &str) -> &str {
    class_name.rsplit('.').next().unwrap_or(class_name)
}

/// Build the signature of the live tree under `root`.
///
/// Pre-order walk appending `LeafClass;` per node, children in native
/// order, stopping once the string is longer than `max_length`. The result
/// is cut to exactly `max_length` characters so that trees agreeing on that
/// prefix always collide. An absent root yields the empty string.
pub fn build_signature(
    driver: &mut dyn AutomationDriver,
    root: Option<&ElementRef>,
    config: &SignatureConfig,
) -> String {
    let Some(root) = root else {
        return String::new();
    };

    let mut signature = String::new();
    walk(driver, root, config.max_length, &mut signature);
    finalize(signature, config)
}

fn walk(driver: &mut dyn AutomationDriver, node: &ElementRef, max_length: usize, out: &mut String) {
    if out.chars().count() > max_length {
        return;
    }

    // A node that vanished mid-walk ends its branch
    let Some(class_name) = driver.class_name(node) else {
        return;
    };

    out.push_str(leaf_class_name(&class_name));
    out.push(SEPARATOR);

    for child in driver.children(node) {
        walk(driver, &child, max_length, out);
    }
}

/// Truncate a class-hierarchy string and apply the storage strategy.
pub fn finalize(mut classes: String, config: &SignatureConfig) -> String {
    if let Some((cut, _)) = classes.char_indices().nth(config.max_length) {
        classes.truncate(cut);
    }

    match config.strategy {
        SignatureStrategy::Raw => classes,
        SignatureStrategy::Sha1 => {
            use sha1::{Digest, Sha1};

            let mut hasher = Sha1::new();
            hasher.update(classes.as_bytes());
            format!("{:x}", hasher.finalize())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_class_strips_namespace() {
        assert_eq!(leaf_class_name("android.widget.Button"), "Button");
        assert_eq!(leaf_class_name("Button"), "Button");
        assert_eq!(leaf_class_name(""), "");
    }

    #[test]
    fn finalize_truncates_on_char_boundary() {
        let config = SignatureConfig {
            max_length: 3,
            strategy: SignatureStrategy::Raw,
        };
        assert_eq!(finalize("意見與協助".into(), &config), "意見與");
        assert_eq!(finalize("ab".into(), &config), "ab");
    }

    #[test]
    fn sha1_strategy_is_fixed_width_hex() {
        let config = SignatureConfig {
            max_length: 160,
            strategy: SignatureStrategy::Sha1,
        };
        let a = finalize("FrameLayout;Button;".into(), &config);
        let b = finalize("FrameLayout;Button;".into(), &config);
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("SHA1".parse::<SignatureStrategy>(), Ok(SignatureStrategy::Sha1));
        assert_eq!("raw".parse::<SignatureStrategy>(), Ok(SignatureStrategy::Raw));
        assert!("md5".parse::<SignatureStrategy>().is_err());
    }
}
