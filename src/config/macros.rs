/// Configuration macros for zero-repetition config definitions

/// Define a configuration struct with embedded defaults
///
/// Declares field name, type, and default in one place and generates the
/// struct with public fields, a `Default` implementation, and serde support
/// with `#[serde(default)]`.
///
/// # Example
/// ```ignore
/// config_struct! {
///     pub struct PulseConfig {
///         sync_interval_ms: u64 = 5000,
///         init_sync_limit: usize = 5,
///     }
/// }
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
