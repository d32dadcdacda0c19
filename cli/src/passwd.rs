use clap::{arg, ArgMatches};

pub fn cmd() -> clap::Command {
    clap::Command::new("hash-password")
        .display_order(20)
        .arg_required_else_help(true)
        .about("Hashes a password for use as the operator password in the config")
        .arg(arg!(<password> "Plain text password"))
}

pub fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let password = matches
        .get_one::<String>("password")
        .ok_or_else(|| anyhow::anyhow!("password is required"))?;
    println!("{}", snapcode::auth::hash_password(password)?);
    Ok(())
}
