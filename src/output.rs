// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Writing the rendered changelog to disk.
///
/// The document is written in one call once rendering has finished, so a
/// failed run never leaves a partial changelog behind.
use std::{fs, path::Path};

use tracing::info;

use crate::{Error, error::filesystem_error};

/// Writes `html` to `destination`, creating missing parent directories and
/// replacing any existing file.
///
/// # Errors
///
/// Returns [`Error::Filesystem`] when a directory cannot be created or the
/// file cannot be written.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use prlog::write_changelog;
///
/// # fn example() -> Result<(), prlog::Error> {
/// write_changelog(Path::new("docs/changelog.html",), "<html></html>",)?;
/// # Ok(())
/// # }
/// ```
pub fn write_changelog(destination: &Path, html: &str,) -> Result<(), Error,>
{
    if let Some(parent,) = destination.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent,).map_err(|source| filesystem_error(parent, source,),)?;
    }

    fs::write(destination, html,).map_err(|source| filesystem_error(destination, source,),)?;
    info!("Wrote {} bytes to {}", html.len(), destination.display());

    Ok((),)
}
