use {
    aargvark::{
        vark,
        Aargvark,
    },
    credential_server::{
        hash,
        interface::{
            config::{
                Config,
                HashScheme,
                DEFAULT_BCRYPT_COST,
            },
            user::StoredCredential,
        },
    },
    loga::ResultContext,
};

#[derive(Aargvark)]
struct BuildUserArgs {
    name: String,
    /// Bcrypt cost, defaults to 10
    cost: Option<u32>,
}

#[derive(Aargvark)]
struct CheckPasswordArgs {
    /// Stored hash, bcrypt or PHC format
    hash: String,
}

#[derive(Aargvark)]
enum Command {
    /// Prompt for a password and print a user entry for the server config `users`
    /// list
    BuildUser(BuildUserArgs),
    /// Prompt for a password and check it against a stored hash
    CheckPassword(CheckPasswordArgs),
    /// Print the JSON schema of the server config
    ConfigSchema,
}

#[derive(Aargvark)]
struct Args {
    command: Command,
}

fn main() -> Result<(), loga::Error> {
    let args = vark::<Args>();
    match args.command {
        Command::BuildUser(args) => {
            if args.name.is_empty() {
                return Err(loga::err("User name is empty"));
            }
            let scheme = HashScheme::Bcrypt { cost: args.cost.unwrap_or(DEFAULT_BCRYPT_COST) };
            scheme.validate()?;
            let pw = rpassword::prompt_password("Enter your password: ")?;
            let pw2 = rpassword::prompt_password("Confirm your password: ")?;
            if pw != pw2 {
                return Err(loga::err("Passwords don't match"));
            }
            if pw.is_empty() {
                return Err(loga::err("Password is empty"));
            }
            println!(
                "{}",
                serde_json::to_string_pretty(
                    &StoredCredential {
                        name: args.name,
                        password_hash: hash::hash_password(scheme, &pw).context("Error hashing password")?,
                    },
                ).unwrap()
            );
            return Ok(());
        },
        Command::CheckPassword(args) => {
            let pw = rpassword::prompt_password("Enter the password to check: ")?;
            if hash::verify_password(&pw, &args.hash).context("Error checking password")? {
                println!("Match");
            } else {
                println!("Mismatch");
            }
            return Ok(());
        },
        Command::ConfigSchema => {
            println!("{}", serde_json::to_string_pretty(&schemars::schema_for!(Config)).unwrap());
            return Ok(());
        },
    }
}
