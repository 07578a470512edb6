use {
    schemars::JsonSchema,
    serde::{
        Deserialize,
        Serialize,
    },
    std::fmt,
};

/// A registered user's authentication secret, as held by the user directory.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct StoredCredential {
    pub name: String,
    /// Self-describing password hash: `$2b$...` modular crypt format for bcrypt,
    /// PHC format for argon2 and scrypt:
    /// https://github.com/P-H-C/phc-string-format/blob/master/phc-sf-spec.md
    pub password_hash: String,
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f
            .debug_struct("StoredCredential")
            .field("name", &self.name)
            .field("password_hash", &"<redacted>")
            .finish();
    }
}

/// Body of both the registration and the login request.
#[derive(Deserialize)]
pub struct CredentialsBody {
    pub name: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub name: String,
}
