use std::{fs::File, io::Write, path::Path};

use tracing::info;

use crate::{
    cpu::ExecResult,
    error::{SimError, SimResult},
};

/// Writes one line per instruction, in program order, holding its fetch,
/// decode, dispatch, issue, execute, complete and retire cycles separated by
/// single spaces.
pub fn write_timelines<W: Write>(res: &ExecResult, out: W) -> SimResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_writer(out);

    for timeline in &res.timelines {
        writer.serialize(timeline)?;
    }

    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_timelines_to_file(res: &ExecResult, path: impl AsRef<Path>) -> SimResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| SimError::Write(path.to_owned(), e))?;
    write_timelines(res, file)?;
    info!(path = %path.display(), insts = res.timelines.len(), "wrote results");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> ExecResult {
        ExecResult {
            cycles_taken: 8,
            insts_retired: 2,
            timelines: vec![[0, 1, 2, 3, 4, 5, 6], [0, 1, 2, 5, 6, 7, 7]],
        }
    }

    #[test]
    fn test_format() {
        let mut buf = Vec::new();
        write_timelines(&result(), &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "0 1 2 3 4 5 6\n0 1 2 5 6 7 7\n"
        );
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_timelines_to_file(&result(), &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap().lines().count(),
            2
        );
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn test_failing_writer() {
        assert!(matches!(
            write_timelines(&result(), Broken),
            Err(SimError::Csv(_))
        ));
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        assert!(write_timelines_to_file(&result(), &path).is_err());
    }
}
