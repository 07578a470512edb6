use {
    super::user::StoredCredential,
    schemars::JsonSchema,
    serde::{
        Deserialize,
        Serialize,
    },
    std::net::SocketAddr,
};

/// Cost used for new bcrypt hashes unless configured otherwise.
pub const DEFAULT_BCRYPT_COST: u32 = 10;
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

/// Algorithm and parameters used for newly registered passwords. Stored hashes
/// carry their own parameters, so changing this doesn't invalidate existing
/// users.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum HashScheme {
    Bcrypt {
        /// Log2 of the number of key expansion rounds
        cost: u32,
    },
    /// Argon2id
    Argon2 {
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    },
    /// Scrypt with the recommended block size and parallelism
    Scrypt {
        /// Log2 of the CPU/memory cost
        log_n: u8,
    },
}

impl Default for HashScheme {
    fn default() -> Self {
        return HashScheme::Bcrypt { cost: DEFAULT_BCRYPT_COST };
    }
}

impl HashScheme {
    pub fn argon2_default() -> Self {
        return HashScheme::Argon2 {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        };
    }

    pub fn scrypt_default() -> Self {
        return HashScheme::Scrypt { log_n: scrypt::Params::RECOMMENDED_LOG_N };
    }

    pub fn validate(&self) -> Result<(), loga::Error> {
        match *self {
            HashScheme::Bcrypt { cost } => {
                if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
                    return Err(
                        loga::err(
                            format!(
                                "Bcrypt cost [{}] out of range, must be between {} and {}",
                                cost,
                                MIN_BCRYPT_COST,
                                MAX_BCRYPT_COST
                            ),
                        ),
                    );
                }
            },
            HashScheme::Argon2 { memory_kib, iterations, parallelism } => {
                argon2::Params::new(
                    memory_kib,
                    iterations,
                    parallelism,
                    None,
                ).map_err(|e| loga::err(format!("Invalid argon2 parameters: {}", e)))?;
            },
            HashScheme::Scrypt { log_n } => {
                scrypt::Params::new(
                    log_n,
                    scrypt::Params::RECOMMENDED_R,
                    scrypt::Params::RECOMMENDED_P,
                    scrypt::Params::RECOMMENDED_LEN,
                ).map_err(|e| loga::err(format!("Invalid scrypt parameters: {}", e)))?;
            },
        }
        return Ok(());
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Config {
    /// Socket address to bind to
    pub bind_addr: SocketAddr,
    /// Hash algorithm for new registrations
    #[serde(default)]
    pub hash_scheme: HashScheme,
    /// Users to load into the directory at startup, as produced by `credential-cli
    /// build-user`
    #[serde(default)]
    pub users: Vec<StoredCredential>,
    /// Serve the list of registered names on `GET /users`
    #[serde(default)]
    pub expose_user_list: bool,
    #[serde(default)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = serde_json::from_str::<Config>(r#"{"bind_addr": "127.0.0.1:3000"}"#).unwrap();
        assert_eq!(config.hash_scheme, HashScheme::Bcrypt { cost: 10 });
        assert!(config.users.is_empty());
        assert!(!config.expose_user_list);
    }

    #[test]
    fn scheme_variants_parse() {
        let scheme = serde_json::from_str::<HashScheme>(r#"{"bcrypt": {"cost": 12}}"#).unwrap();
        assert_eq!(scheme, HashScheme::Bcrypt { cost: 12 });
        let scheme = serde_json::from_str::<HashScheme>(r#"{"scrypt": {"log_n": 17}}"#).unwrap();
        assert_eq!(scheme, HashScheme::scrypt_default());
        let scheme =
            serde_json::from_str::<HashScheme>(
                r#"{"argon2": {"memory_kib": 19456, "iterations": 2, "parallelism": 1}}"#,
            ).unwrap();
        assert_eq!(scheme, HashScheme::argon2_default());
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{"bind_addr": "127.0.0.1:3000", "port": 3000}"#).is_err());
    }

    #[test]
    fn validate_bcrypt_cost_range() {
        assert!(HashScheme::Bcrypt { cost: 4 }.validate().is_ok());
        assert!(HashScheme::Bcrypt { cost: 31 }.validate().is_ok());
        assert!(HashScheme::Bcrypt { cost: 3 }.validate().is_err());
        assert!(HashScheme::Bcrypt { cost: 32 }.validate().is_err());
    }

    #[test]
    fn validate_scrypt_params() {
        assert!(HashScheme::scrypt_default().validate().is_ok());
        assert!(HashScheme::Scrypt { log_n: 64 }.validate().is_err());
    }

    #[test]
    fn validate_argon2_params() {
        assert!(HashScheme::argon2_default().validate().is_ok());
        assert!(HashScheme::Argon2 {
            memory_kib: 19456,
            iterations: 0,
            parallelism: 1,
        }.validate().is_err());
    }
}
