use crate::manifest::parse;
use crate::{ui, Config};
use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

pub fn execute(config: &Config, file: Option<PathBuf>, check: bool) -> Result<()> {
    let path = super::manifest_or_default(config, file)?;
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read manifest file {:?}", path))?;

    let manifest = match parse(&contents).into_result() {
        Ok(manifest) => manifest,
        Err(errors) => {
            for error in errors.iter() {
                ui::error(format!("{}: {error}", path.display()));
            }
            anyhow::bail!("Cannot render {}: {errors}", path.display());
        }
    };

    let rendered = manifest.render();

    if !check {
        return write_rendered(&mut io::stdout().lock(), &rendered);
    }

    if rendered == contents {
        ui::success("Render", format!("{} is normalised.", path.display()));
        Ok(())
    } else {
        anyhow::bail!(
            "{} is not normalised; run `devreqs render` to see the expected form.",
            path.display()
        );
    }
}

fn write_rendered(out: &mut impl Write, rendered: &str) -> Result<()> {
    out.write_all(rendered.as_bytes())
        .and_then(|()| out.flush())
        .context("Failed to write rendered manifest")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_rendered_text() {
        let mut out = Vec::new();
        write_rendered(&mut out, "black==22.6.0\n").unwrap();
        assert_eq!(out, b"black==22.6.0\n");
    }

    #[test]
    fn closed_output_is_an_error() {
        let error = write_rendered(&mut ClosedPipe, "black==22.6.0\n").unwrap_err();
        assert!(format!("{error:#}").contains("Failed to write rendered manifest"));
    }
}
