//! Blocking password hashing primitives. Every scheme embeds its algorithm,
//! parameters and salt in the output string, so verification needs nothing but
//! the stored string.
use {
    crate::interface::config::HashScheme,
    argon2::Argon2,
    loga::{
        ea,
        ResultContext,
    },
    password_hash::{
        PasswordHash,
        PasswordHasher,
        PasswordVerifier,
        SaltString,
    },
    rand::{
        rngs::OsRng,
        RngCore,
    },
    scrypt::Scrypt,
};

/// Bcrypt ignores everything past this many bytes of input.
pub const BCRYPT_MAX_INPUT: usize = 72;

fn is_bcrypt(stored: &str) -> bool {
    return ["$2a$", "$2b$", "$2x$", "$2y$"].iter().any(|p| stored.starts_with(p));
}

/// Hash `password` with a freshly generated salt.
pub fn hash_password(scheme: HashScheme, password: &str) -> Result<String, loga::Error> {
    match scheme {
        HashScheme::Bcrypt { cost } => {
            if password.len() > BCRYPT_MAX_INPUT {
                return Err(
                    loga::err(format!("Password exceeds the bcrypt input limit of {} bytes", BCRYPT_MAX_INPUT)),
                );
            }
            let mut salt = [0u8; 16];
            OsRng.fill_bytes(&mut salt);
            let parts =
                bcrypt::hash_with_salt(password.as_bytes(), cost, salt)
                    .context_with("Error computing bcrypt hash", ea!(cost = cost))?;
            return Ok(parts.format_for_version(bcrypt::Version::TwoB));
        },
        HashScheme::Argon2 { memory_kib, iterations, parallelism } => {
            let params =
                argon2::Params::new(
                    memory_kib,
                    iterations,
                    parallelism,
                    None,
                ).map_err(|e| loga::err(format!("Invalid argon2 parameters: {}", e)))?;
            let hasher = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
            return Ok(
                hasher
                    .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
                    .context("Error computing argon2 hash")?
                    .to_string(),
            );
        },
        HashScheme::Scrypt { log_n } => {
            let params =
                scrypt::Params::new(
                    log_n,
                    scrypt::Params::RECOMMENDED_R,
                    scrypt::Params::RECOMMENDED_P,
                    scrypt::Params::RECOMMENDED_LEN,
                ).context_with("Invalid scrypt parameters", ea!(log_n = log_n))?;
            return Ok(
                Scrypt
                    .hash_password_customized(
                        password.as_bytes(),
                        None,
                        None,
                        params,
                        &SaltString::generate(&mut OsRng),
                    )
                    .context("Error computing scrypt hash")?
                    .to_string(),
            );
        },
    }
}

fn parse_phc(stored: &str) -> Result<PasswordHash<'_>, loga::Error> {
    return Ok(PasswordHash::new(stored).context("Stored hash is in neither bcrypt nor PHC format")?);
}

/// Reject stored hashes that `verify_password` would fail on, without running
/// the hash.
pub fn check_stored(stored: &str) -> Result<(), loga::Error> {
    if is_bcrypt(stored) {
        stored.parse::<bcrypt::HashParts>().context("Malformed bcrypt hash")?;
        return Ok(());
    }
    let hash = parse_phc(stored)?;
    if hash.salt.is_none() || hash.hash.is_none() {
        return Err(loga::err(format!("Stored {} hash is missing its salt or digest", hash.algorithm)));
    }
    match hash.algorithm.as_str() {
        "argon2id" | "argon2i" | "argon2d" => {
            argon2::Params::try_from(&hash).context("Invalid argon2 parameters in stored hash")?;
        },
        "scrypt" => {
            scrypt::Params::try_from(&hash).context("Invalid scrypt parameters in stored hash")?;
        },
        other => {
            return Err(loga::err(format!("Unsupported hash algorithm [{}]", other)));
        },
    }
    return Ok(());
}

/// Check `password` against a stored hash of any supported scheme. A wrong
/// password is `Ok(false)`; `Err` means the check itself couldn't run.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, loga::Error> {
    if is_bcrypt(stored) {
        // Can't have been registered, and bcrypt would compare only the prefix
        if password.len() > BCRYPT_MAX_INPUT {
            return Ok(false);
        }
        return Ok(bcrypt::verify(password.as_bytes(), stored).context("Error verifying bcrypt hash")?);
    }
    let hash = parse_phc(stored)?;
    let res = match hash.algorithm.as_str() {
        "argon2id" | "argon2i" | "argon2d" => Argon2::default().verify_password(password.as_bytes(), &hash),
        "scrypt" => Scrypt.verify_password(password.as_bytes(), &hash),
        other => {
            return Err(loga::err(format!("Unsupported hash algorithm [{}]", other)));
        },
    };
    match res {
        Ok(()) => return Ok(true),
        Err(password_hash::Error::Password) => return Ok(false),
        Err(e) => return Err(loga::err(format!("Error verifying {} hash: {}", hash.algorithm, e))),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::interface::config::MIN_BCRYPT_COST,
    };

    const FAST_BCRYPT: HashScheme = HashScheme::Bcrypt { cost: MIN_BCRYPT_COST };
    const FAST_ARGON2: HashScheme = HashScheme::Argon2 {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    };
    const FAST_SCRYPT: HashScheme = HashScheme::Scrypt { log_n: 4 };

    /// "s3cret" hashed with scrypt N=16, r=8, p=1 by an independent implementation.
    const SCRYPT_S3CRET: &str = "$scrypt$ln=4,r=8,p=1$Zml4ZWRzYWx0Ynl0ZXMxNg$BDFl9BNQPN2E6PMFDNj9AlYCg3S97FBLHt3CaDU6gfI";

    #[test]
    fn bcrypt_hash_is_self_describing() {
        let hash = hash_password(FAST_BCRYPT, "s3cret").unwrap();
        assert!(hash.starts_with("$2b$04$"));
        assert_eq!(hash.len(), 60);
        assert!(verify_password("s3cret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn default_bcrypt_cost_is_embedded() {
        let hash = hash_password(HashScheme::default(), "s3cret").unwrap();
        assert!(hash.starts_with("$2b$10$"));
    }

    #[test]
    fn argon2_hash_is_phc() {
        let hash = hash_password(FAST_ARGON2, "s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
        assert!(verify_password("s3cret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn scrypt_hash_is_phc() {
        let hash = hash_password(FAST_SCRYPT, "s3cret").unwrap();
        assert!(hash.starts_with("$scrypt$ln=4,r=8,p=1$"));
        assert!(verify_password("s3cret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn scrypt_known_hash_verifies() {
        assert!(verify_password("s3cret", SCRYPT_S3CRET).unwrap());
        assert!(!verify_password("s3cret ", SCRYPT_S3CRET).unwrap());
    }

    #[test]
    fn same_plaintext_gets_different_salts() {
        for scheme in [FAST_BCRYPT, FAST_ARGON2, FAST_SCRYPT] {
            let a = hash_password(scheme, "s3cret").unwrap();
            let b = hash_password(scheme, "s3cret").unwrap();
            assert_ne!(a, b);
            assert!(verify_password("s3cret", &a).unwrap());
            assert!(verify_password("s3cret", &b).unwrap());
        }
    }

    #[test]
    fn bcrypt_rejects_overlong_input() {
        let long = "a".repeat(BCRYPT_MAX_INPUT + 1);
        assert!(hash_password(FAST_BCRYPT, &long).is_err());
        let hash = hash_password(FAST_BCRYPT, &long[..BCRYPT_MAX_INPUT]).unwrap();
        assert!(verify_password(&long[..BCRYPT_MAX_INPUT], &hash).unwrap());
        assert!(!verify_password(&long, &hash).unwrap());
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        assert!(verify_password("s3cret", "s3cret").is_err());
        assert!(verify_password("s3cret", "").is_err());
        assert!(verify_password("s3cret", "$2b$10$tooshort").is_err());
        assert!(verify_password("s3cret", "$md5$abc$def").is_err());
    }

    #[test]
    fn check_stored_accepts_every_scheme() {
        for scheme in [FAST_BCRYPT, FAST_ARGON2, FAST_SCRYPT] {
            check_stored(&hash_password(scheme, "s3cret").unwrap()).unwrap();
        }
        check_stored(SCRYPT_S3CRET).unwrap();
    }

    #[test]
    fn check_stored_rejects_malformed() {
        for stored in [
            "",
            "notahash",
            "s3cret",
            "$2b$10$tooshort",
            "$2b$xx$abcdefghijklmnopqrstuvwxyzabcdefghijklmnopqrstuvwxyza",
            "$md5$abc$def",
            "$argon2id$v=19$m=1024,t=1,p=1",
            "$scrypt$ln=4,r=8,p=1,q=2$Zml4ZWRzYWx0Ynl0ZXMxNg$BDFl9BNQPN2E6PMFDNj9AlYCg3S97FBLHt3CaDU6gfI",
        ] {
            assert!(check_stored(stored).is_err(), "accepted [{}]", stored);
        }
    }
}
