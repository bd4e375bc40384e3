//! Closed enumerations persisted as short text codes.
//!
//! Every lifecycle or classification column in the database stores a short
//! code (`"P"`, `"IP"`, ...). [`coded_enum!`] declares the Rust side of such a
//! column: a `Copy` enum that serializes to its code in JSON, parses from it,
//! and reads/writes a diesel `Text` column directly.

/// Declares an enum backed by a text code.
///
/// ```ignore
/// coded_enum! {
///     /// Lifecycle of a bond.
///     pub enum BondStatus {
///         Pending => "P",
///         Accepted => "A",
///     }
/// }
/// ```
#[macro_export]
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $code:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash,
            ::serde::Serialize, ::serde::Deserialize,
            ::diesel::AsExpression, ::diesel::FromSqlRow,
        )]
        #[diesel(sql_type = ::diesel::sql_types::Text)]
        pub enum $name {
            $(
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.code())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok(Self::$variant),)+
                    other => Err(format!(
                        "unknown {} code: {other}",
                        stringify!($name)
                    )),
                }
            }
        }

        impl ::diesel::serialize::ToSql<::diesel::sql_types::Text, ::diesel::pg::Pg> for $name {
            fn to_sql<'b>(
                &'b self,
                out: &mut ::diesel::serialize::Output<'b, '_, ::diesel::pg::Pg>,
            ) -> ::diesel::serialize::Result {
                use ::std::io::Write;
                out.write_all(self.code().as_bytes())?;
                Ok(::diesel::serialize::IsNull::No)
            }
        }

        impl ::diesel::deserialize::FromSql<::diesel::sql_types::Text, ::diesel::pg::Pg> for $name {
            fn from_sql(
                bytes: ::diesel::pg::PgValue<'_>,
            ) -> ::diesel::deserialize::Result<Self> {
                let raw = <String as ::diesel::deserialize::FromSql<
                    ::diesel::sql_types::Text,
                    ::diesel::pg::Pg,
                >>::from_sql(bytes)?;
                raw.parse::<$name>().map_err(Into::into)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    crate::coded_enum! {
        pub enum Sample {
            First => "F",
            SecondPhase => "SP",
        }
    }

    #[test]
    fn codes_round_trip_through_from_str() {
        for variant in Sample::ALL {
            assert_eq!(variant.code().parse::<Sample>().unwrap(), *variant);
        }
        assert!("X".parse::<Sample>().is_err());
    }

    #[test]
    fn serializes_as_code() {
        assert_eq!(serde_json::to_string(&Sample::SecondPhase).unwrap(), "\"SP\"");
        let parsed: Sample = serde_json::from_str("\"F\"").unwrap();
        assert_eq!(parsed, Sample::First);
        assert!(serde_json::from_str::<Sample>("\"first\"").is_err());
    }
}
