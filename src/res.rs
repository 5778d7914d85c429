/// Embeds a file from the crate's `res/` directory.
#[macro_export]
macro_rules! include_res {
    ($p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// Table layout for the `participants` and `messages` collections.
pub const SCHEMA: &str = include_res!("/schema.sql");
