//! Shared fixtures for unit tests.

use std::fs::File;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::Builder;

/// Build a tar.gz archive at `dest` containing the given (path, contents)
/// pairs.
pub(crate) fn build_archive(dest: &Path, files: &[(&str, &str)]) {
    let tar_gz = File::create(dest).unwrap();
    let enc = GzEncoder::new(tar_gz, Compression::default());
    let mut tar = Builder::new(enc);

    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        tar.append_data(&mut header, name, contents.as_bytes())
            .unwrap();
    }

    tar.into_inner().unwrap().finish().unwrap();
}
