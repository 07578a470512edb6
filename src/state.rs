use {
    crate::credential::CredentialManager,
    loga::Log,
};

pub struct State {
    pub log: Log,
    pub credentials: CredentialManager,
    /// Answer `GET /users` with the registered names rather than 404
    pub expose_user_list: bool,
}
