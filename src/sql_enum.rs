//! Text storage for fieldless enums.

/// Implements [FromStr](std::str::FromStr), [Display](std::fmt::Display) and
/// text based SQL storage for a fieldless enum.
///
/// The enum must provide `ALL`, `as_str` and `label`. `as_str` is the stored
/// and submitted form, `label` is what users see.
macro_rules! sql_text_enum {
    ($name:ident) => {
        impl std::str::FromStr for $name {
            type Err = $crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .into_iter()
                    .find(|variant| variant.as_str() == s)
                    .ok_or_else(|| $crate::Error::UnknownOption(s.to_owned()))
            }
        }

        impl rusqlite::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value.as_str()?.parse().map_err(|error: $crate::Error| {
                    rusqlite::types::FromSqlError::Other(Box::new(error))
                })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

pub(crate) use sql_text_enum;
