//! Opaque identifiers of the form `base64("User:<pk>")`.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::AccountError;

pub const USER_TYPE: &str = "User";

pub fn encode(type_name: &str, pk: i64) -> String {
    STANDARD.encode(format!("{type_name}:{pk}"))
}

/// Splits a global id into its type tag and primary key.
pub fn decode(global_id: &str) -> Result<(String, i64), AccountError> {
    let invalid = || AccountError::InvalidId(format!("Unable to parse global ID \"{global_id}\""));
    let bytes = STANDARD.decode(global_id).map_err(|_| invalid())?;
    let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
    let (type_name, pk) = raw.split_once(':').ok_or_else(invalid)?;
    let pk = pk.parse::<i64>().map_err(|_| invalid())?;
    Ok((type_name.to_string(), pk))
}

/// Decodes a global id that must refer to a `User`.
pub fn decode_user(global_id: &str) -> Result<i64, AccountError> {
    let (type_name, pk) = decode(global_id)?;
    if type_name != USER_TYPE {
        return Err(AccountError::InvalidId(format!(
            "Must receive a {USER_TYPE} id, got {type_name}"
        )));
    }
    Ok(pk)
}
