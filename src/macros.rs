//! # Macros
//!
//! $$
//! \text{macro expansion} : (\text{answer table}) \mapsto (\text{enum} + \text{serde} + \text{FromStr})
//! $$
//!

/// Closed questionnaire answer set.
///
/// Each variant carries its localized wire label, a snake_case alias accepted
/// on input, and the integer value the profiler assigns to it.
macro_rules! localized_enum {
  (
    $(#[$meta:meta])*
    $name:ident {
      $(
        $(#[$vmeta:meta])*
        $variant:ident ($alias:literal) => $label:literal = $value:expr
      ),+ $(,)?
    }
  ) => {
    $(#[$meta])*
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub enum $name {
      $(
        $(#[$vmeta])*
        #[serde(rename = $label, alias = $alias)]
        $variant,
      )+
    }

    impl $name {
      /// Every answer, in ascending order of value.
      pub const ALL: &'static [$name] = &[$($name::$variant),+];

      /// Localized label used on the wire.
      pub fn label(self) -> &'static str {
        match self {
          $($name::$variant => $label,)+
        }
      }

      pub fn value(self) -> u32 {
        match self {
          $($name::$variant => $value,)+
        }
      }
    }

    impl std::fmt::Display for $name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
      }
    }

    impl std::str::FromStr for $name {
      type Err = crate::error::RiskError;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        $(
          if s == $label || s.eq_ignore_ascii_case($alias) {
            return Ok($name::$variant);
          }
        )+
        Err(crate::error::RiskError::InvalidParameter {
          name: stringify!($name),
          reason: format!("unknown answer {s:?}"),
        })
      }
    }
  };
}
