//! SQL declared type to model field type policy.
//!
//! Rules are checked in order and the first match wins. Keywords are
//! compared case-sensitively, so `varchar(20)` does not match `VARCHAR`.

use tracing::warn;

/// Type used when nothing matches, the model's string alias
pub const DEFAULT_TYPE: &str = "StrType";

/// How a rule compares against the declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    Exact,
    Prefix,
}

/// One `(pattern, target)` entry of the policy table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub pattern: &'static str,
    pub matching: Match,
    pub target: &'static str,
}

impl Rule {
    const fn exact(pattern: &'static str, target: &'static str) -> Self {
        Self {
            pattern,
            matching: Match::Exact,
            target,
        }
    }

    const fn prefix(pattern: &'static str, target: &'static str) -> Self {
        Self {
            pattern,
            matching: Match::Prefix,
            target,
        }
    }

    pub fn matches(&self, declared: &str) -> bool {
        match self.matching {
            Match::Exact => declared == self.pattern,
            Match::Prefix => declared.starts_with(self.pattern),
        }
    }
}

/// Types with no scalar equivalent, mapped the same under every policy
const COMPOSITE_RULES: &[Rule] = &[Rule::exact("BLOB", "Blob"), Rule::exact("CLOB", "Clob")];

const FULL_RULES: &[Rule] = &[
    Rule::exact("INTEGER", "Integer"),
    Rule::exact("INT", "Int"),
    Rule::exact("INT2", "Int2"),
    Rule::exact("INT8", "Int8"),
    Rule::exact("TINYINT", "Tinyint"),
    Rule::exact("SMALLINT", "Smallint"),
    Rule::exact("MEDIUMINT", "Mediumint"),
    Rule::exact("BOOLEAN", "Boolean"),
    Rule::exact("BIGINT", "Bigint"),
    Rule::exact("UNSIGNED BIG INT", "UBigint"),
    Rule::exact("DATE", "Date"),
    Rule::exact("DATETIME", "Datetime"),
    Rule::exact("NUMERIC", "Numeric"),
    Rule::prefix("DECIMAL", "Decimal"),
    Rule::exact("REAL", "Real"),
    Rule::exact("DOUBLE PRECISION", "DoublePrcsn"),
    Rule::exact("DOUBLE", "Double"),
    Rule::exact("FLOAT", "Float"),
    Rule::exact("TEXT", "Text"),
    Rule::prefix("CHARACTER", "Character"),
    Rule::prefix("VARYING CHARACTER", "Varchar"),
    Rule::prefix("VARCHAR", "Varchar"),
    Rule::prefix("NATIVE CHARACTER", "Nchar"),
    Rule::prefix("NCHAR", "Nchar"),
    Rule::prefix("NVARCHAR", "Nvarchar"),
];

const BASIC_RULES: &[Rule] = &[
    Rule::exact("INTEGER", "i64"),
    Rule::exact("INT", "i64"),
    Rule::exact("INT2", "i64"),
    Rule::exact("INT8", "i64"),
    Rule::exact("TINYINT", "i64"),
    Rule::exact("SMALLINT", "i64"),
    Rule::exact("MEDIUMINT", "i64"),
    Rule::exact("BIGINT", "i64"),
    Rule::exact("UNSIGNED BIG INT", "i64"),
    Rule::exact("REAL", "f64"),
    Rule::exact("DOUBLE", "f64"),
    Rule::exact("DOUBLE PRECISION", "f64"),
    Rule::exact("FLOAT", "f64"),
    Rule::prefix("DECIMAL", "f64"),
    Rule::exact("BOOLEAN", "f64"),
    Rule::exact("DATE", "f64"),
    Rule::exact("DATETIME", "f64"),
    Rule::exact("NUMERIC", "f64"),
    Rule::exact("TEXT", "StrType"),
    Rule::prefix("CHARACTER", "StrType"),
    Rule::prefix("VARYING CHARACTER", "StrType"),
    Rule::prefix("VARCHAR", "StrType"),
    Rule::prefix("NATIVE CHARACTER", "String"),
    Rule::prefix("NCHAR", "String"),
    Rule::prefix("NVARCHAR", "String"),
];

/// Declared SQL type policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMap {
    basic_types_only: bool,
    flag_unmapped: bool,
}

impl TypeMap {
    pub fn new(basic_types_only: bool) -> Self {
        Self {
            basic_types_only,
            flag_unmapped: true,
        }
    }

    /// Whether an unrecognized declared type trips a debug assertion
    pub fn with_flag_unmapped(mut self, flag_unmapped: bool) -> Self {
        self.flag_unmapped = flag_unmapped;
        self
    }

    pub fn is_basic(&self) -> bool {
        self.basic_types_only
    }

    /// Rules consulted by this policy, in match order
    pub fn rules(&self) -> impl Iterator<Item = &'static Rule> {
        let policy = if self.basic_types_only {
            BASIC_RULES
        } else {
            FULL_RULES
        };
        COMPOSITE_RULES.iter().chain(policy.iter())
    }

    /// First matching rule target, `None` when no rule applies
    pub fn lookup(&self, declared: &str) -> Option<&'static str> {
        self.rules()
            .find(|rule| rule.matches(declared))
            .map(|rule| rule.target)
    }

    /// Target type for a declared type, falling back to [`DEFAULT_TYPE`]
    pub fn map_type(&self, declared: Option<&str>) -> &'static str {
        let declared = match declared {
            Some(declared) if !declared.is_empty() => declared,
            _ => return DEFAULT_TYPE,
        };

        match self.lookup(declared) {
            Some(target) => target,
            None => {
                warn!(declared_type = ?declared, fallback = DEFAULT_TYPE, "Unmapped declared SQL type");
                debug_assert!(
                    !self.flag_unmapped,
                    "declared SQL type {declared:?} matches no type rule"
                );
                DEFAULT_TYPE
            }
        }
    }
}

impl Default for TypeMap {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> TypeMap {
        TypeMap::new(false).with_flag_unmapped(false)
    }

    fn basic() -> TypeMap {
        TypeMap::new(true).with_flag_unmapped(false)
    }

    #[test]
    fn test_integer_types() {
        let map = full();
        assert_eq!(map.map_type(Some("INTEGER")), "Integer");
        assert_eq!(map.map_type(Some("INT")), "Int");
        assert_eq!(map.map_type(Some("INT2")), "Int2");
        assert_eq!(map.map_type(Some("INT8")), "Int8");
        assert_eq!(map.map_type(Some("TINYINT")), "Tinyint");
        assert_eq!(map.map_type(Some("SMALLINT")), "Smallint");
        assert_eq!(map.map_type(Some("MEDIUMINT")), "Mediumint");
        assert_eq!(map.map_type(Some("UNSIGNED BIG INT")), "UBigint");
    }

    #[test]
    fn test_bigint_distinct_from_int_in_full_mode() {
        assert_eq!(full().map_type(Some("BIGINT")), "Bigint");
        assert_ne!(full().map_type(Some("BIGINT")), full().map_type(Some("INT")));
    }

    #[test]
    fn test_bigint_collapses_in_basic_mode() {
        assert_eq!(basic().map_type(Some("BIGINT")), "i64");
        assert_eq!(basic().map_type(Some("BIGINT")), basic().map_type(Some("INTEGER")));
    }

    #[test]
    fn test_floating_and_date_types() {
        let map = full();
        assert_eq!(map.map_type(Some("REAL")), "Real");
        assert_eq!(map.map_type(Some("DOUBLE")), "Double");
        assert_eq!(map.map_type(Some("DOUBLE PRECISION")), "DoublePrcsn");
        assert_eq!(map.map_type(Some("FLOAT")), "Float");
        assert_eq!(map.map_type(Some("NUMERIC")), "Numeric");
        assert_eq!(map.map_type(Some("BOOLEAN")), "Boolean");
        assert_eq!(map.map_type(Some("DATE")), "Date");
        assert_eq!(map.map_type(Some("DATETIME")), "Datetime");

        let map = basic();
        for declared in ["REAL", "BOOLEAN", "DATE", "DATETIME", "NUMERIC", "DECIMAL(10,5)"] {
            assert_eq!(map.map_type(Some(declared)), "f64", "{declared}");
        }
    }

    #[test]
    fn test_prefix_rules() {
        let map = full();
        assert_eq!(map.map_type(Some("DECIMAL")), "Decimal");
        assert_eq!(map.map_type(Some("DECIMAL(10,5)")), "Decimal");
        assert_eq!(map.map_type(Some("VARCHAR(255)")), "Varchar");
        assert_eq!(map.map_type(Some("VARYING CHARACTER(255)")), "Varchar");
        assert_eq!(map.map_type(Some("CHARACTER(20)")), "Character");
        assert_eq!(map.map_type(Some("NCHAR(55)")), "Nchar");
        assert_eq!(map.map_type(Some("NATIVE CHARACTER(70)")), "Nchar");
        assert_eq!(map.map_type(Some("NVARCHAR(100)")), "Nvarchar");
    }

    #[test]
    fn test_text_types() {
        assert_eq!(full().map_type(Some("TEXT")), "Text");
        assert_eq!(basic().map_type(Some("TEXT")), "StrType");
        assert_eq!(basic().map_type(Some("VARCHAR(20)")), "StrType");
        assert_eq!(basic().map_type(Some("NVARCHAR(20)")), "String");
    }

    #[test]
    fn test_composite_types_ignore_policy() {
        for map in [full(), basic()] {
            assert_eq!(map.map_type(Some("BLOB")), "Blob");
            assert_eq!(map.map_type(Some("CLOB")), "Clob");
        }
    }

    #[test]
    fn test_missing_declared_type_uses_default() {
        let map = TypeMap::default();
        assert_eq!(map.map_type(None), DEFAULT_TYPE);
        assert_eq!(map.map_type(Some("")), DEFAULT_TYPE);
    }

    #[test]
    fn test_unrecognized_type_uses_default() {
        assert_eq!(full().map_type(Some("JSON")), DEFAULT_TYPE);
        assert_eq!(full().map_type(Some("integer")), DEFAULT_TYPE);
        assert_eq!(basic().map_type(Some("UUID")), DEFAULT_TYPE);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "matches no type rule")]
    fn test_unrecognized_type_flagged_in_debug_builds() {
        TypeMap::new(false).map_type(Some("JSON"));
    }

    #[test]
    fn test_mapping_independent_of_call_order() {
        let map = full();
        let forward: Vec<_> = FULL_RULES.iter().map(|r| map.map_type(Some(r.pattern))).collect();
        let mut backward: Vec<_> = FULL_RULES
            .iter()
            .rev()
            .map(|r| map.map_type(Some(r.pattern)))
            .collect();
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_every_rule_reachable() {
        // An earlier rule must not shadow a later one for its own pattern.
        for map in [full(), basic()] {
            for rule in map.rules() {
                assert_eq!(map.lookup(rule.pattern), Some(rule.target), "{}", rule.pattern);
            }
        }
    }
}
