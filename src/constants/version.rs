use semver::Version;

const RELEASE_NAMES: [&str; 8] = [
    "Don't Forget. Always, Somewhere, Someone Is Fighting for You",
    "Stay Hungry, Stay Foolish",
    "Nothing Ventured, Nothing Gained",
    "The Night Is Darkest Just Before the Dawn",
    "Words Are, of Course, the Most Powerful Drug",
    "Every Story Has an Ending",
    "Tomorrow Is Another Day",
    "The Best Way Out Is Always Through",
];

fn release_name(version: &Version) -> &'static str {
    RELEASE_NAMES[(version.minor as usize) % RELEASE_NAMES.len()]
}

pub fn get_version() -> String {
    let semver = env!("CARGO_PKG_VERSION").parse::<Version>();

    match semver {
        Ok(semver) => {
            let sha = env!("VERGEN_GIT_SHA");

            // vergen writes this placeholder when it can't see a git checkout.
            if sha == "VERGEN_IDEMPOTENT_OUTPUT" {
                format!("{} - {}", semver, release_name(&semver))
            } else {
                format!(
                    "{} - {} [[`{}`](https://github.com/j1nxie/kyoko/commit/{})]",
                    semver,
                    release_name(&semver),
                    &sha[..sha.len().min(7)],
                    sha
                )
            }
        }
        Err(e) => {
            tracing::warn!(err = ?e, "couldn't parse a semver out of Cargo.toml? defaulting to 0.0.0-unknown.");
            String::from("0.0.0-unknown - No Version Name")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_name_wraps_around() {
        let version = Version::new(2026, 10, 0);

        assert_eq!(release_name(&version), RELEASE_NAMES[2]);
    }

    #[test]
    fn version_string_starts_with_crate_version() {
        assert!(get_version().starts_with(env!("CARGO_PKG_VERSION")));
    }
}
