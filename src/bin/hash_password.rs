use std::env;

use anyhow::Result;

use hrtrack::auth::password;

/// Prints the argon2 hash for a password, for seeding ADMIN_PASSWORD_HASH
/// or provisioning employees by hand.
fn main() -> Result<()> {
    let password_input = match env::args().nth(1) {
        Some(value) => value,
        None => {
            eprintln!("Usage: hash_password <password>");
            std::process::exit(1);
        }
    };

    println!("{}", password::hash_password(&password_input)?);
    Ok(())
}
