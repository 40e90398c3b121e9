use anyhow::Error;
use vergen_gitcl::{Emitter, GitclBuilder};

fn main() -> Result<(), Error> {
    // sqlx::migrate! embeds these at compile time.
    println!("cargo:rerun-if-changed=migrations");

    // release images are built outside a checkout and pass the sha in directly.
    match std::env::var("VERGEN_GIT_SHA") {
        Ok(sha) if sha != "unknown" => {
            println!("cargo:rustc-env=VERGEN_GIT_SHA={sha}");
        }
        _ => {
            let gitcl = GitclBuilder::default().sha(true).build()?;
            Emitter::default().add_instructions(&gitcl)?.emit()?;
        }
    }

    Ok(())
}
