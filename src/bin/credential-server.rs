use {
    aargvark::{
        traits_impls::AargvarkJson,
        vark,
        Aargvark,
    },
    credential_server::{
        credential::CredentialManager,
        directory::MemoryDirectory,
        handlers,
        interface::config::Config,
        state::State,
    },
    htwrap::htserve,
    loga::{
        ea,
        fatal,
        ErrContext,
        Log,
        ResultContext,
    },
    std::sync::Arc,
    taskmanager::TaskManager,
    tokio::net::TcpListener,
    tokio_stream::wrappers::TcpListenerStream,
};

#[derive(Aargvark)]
struct Args {
    config: AargvarkJson<Config>,
    /// Check the config and exit
    validate: Option<()>,
}

async fn main1() -> Result<(), loga::Error> {
    let args = vark::<Args>();
    let config = args.config.value;
    config.hash_scheme.validate().context("Invalid hash scheme in config")?;
    let seed_count = config.users.len();
    let directory = MemoryDirectory::seeded(config.users).context("Invalid seed users in config")?;
    if args.validate.is_some() {
        return Ok(());
    }
    let tm = TaskManager::new();
    let log = Log::new_root(if config.debug {
        loga::DEBUG
    } else {
        loga::INFO
    });
    let state = Arc::new(State {
        credentials: CredentialManager::new(&log, Arc::new(directory), config.hash_scheme),
        log: log.clone(),
        expose_user_list: config.expose_user_list,
    });
    state.credentials.prepare().await.map_err(|e| e.into_loga().context("Error preparing credential manager"))?;
    let routes = handlers::router(&state)?;
    let listener = TcpListener::bind(&config.bind_addr).await.stack_context(&log, "Error binding to address")?;
    log.log_with(
        loga::INFO,
        "Listening",
        ea!(bind_addr = config.bind_addr, seed_users = seed_count, scheme = format!("{:?}", config.hash_scheme)),
    );
    tm.critical_stream(format!("Http server - {}", config.bind_addr), TcpListenerStream::new(listener), {
        let log = log.clone();
        move |conn| {
            let log = log.clone();
            let routes = routes.clone();
            async move {
                match conn {
                    Ok(conn) => {
                        htserve::handler::root_handle_http(&log, routes, conn).await?;
                    },
                    Err(e) => {
                        log.log_err(loga::DEBUG, e.context("Error accepting connection"));
                    },
                }
                return Ok(());
            }
        }
    });
    tm.join(&log).await?;
    return Ok(());
}

#[tokio::main]
async fn main() {
    match main1().await {
        Ok(_) => (),
        Err(e) => {
            fatal(e);
        },
    }
}
