use clap::Parser;
use env_logger::Builder;
use ferric_scp::client::{RemoteMode, RemoteOptions, ScpClient};
use ferric_scp::filesystem;
use ferric_scp::scp::{Context, FileInfos, ProgressStream, ScpError, ScpTransfer, TransferReport};
use interface::{Cli, ScpCommand};
use log::{error, info, warn, LevelFilter};
use std::io::{Read, Write};
use std::path::Path;
use std::process::exit;

mod interface;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut ctx = Context::background();
    if let Some(timeout) = cli.timeout() {
        ctx = ctx.with_timeout(timeout);
    }

    let client = ScpClient::connect(&cli.host, cli.port, &cli.user, cli.password.as_deref())?;
    let options = RemoteOptions {
        recursive: cli.recursive,
        preserve_times: cli.preserve,
    };

    let result = match &cli.command {
        ScpCommand::Push {
            remote_path,
            local_paths,
        } => {
            let mut transfer = client.open(RemoteMode::Sink, remote_path, options, ctx)?;
            let report = push(&mut transfer, local_paths, &cli);
            finish(transfer, report)
        }
        ScpCommand::Pull {
            remote_path,
            local_path,
        } => {
            if cli.recursive {
                warn!("Recursive download is not supported, pulling {} as a single file", remote_path);
            }
            let mut transfer = client.open(RemoteMode::Source, remote_path, options, ctx)?;
            let report = pull(&mut transfer, local_path, &cli);
            finish(transfer, report)
        }
    };

    match result {
        Ok(report) => {
            for failure in &report.failed {
                eprintln!("{}: {}", failure.filename, failure.error);
            }
            println!(
                "{} file(s), {} bytes transferred",
                report.completed.len(),
                report.bytes()
            );
            if !report.failed.is_empty() {
                exit(1);
            }
            Ok(())
        }
        Err(e) => {
            error!("Transfer aborted: {}", e);
            eprintln!("ferric_scp: {}", e);
            exit(1);
        }
    }
}

fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = Builder::from_default_env();
    builder.default_format();
    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(LevelFilter::Info);
    }
    if !cli.log_stderr {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cli.log_file)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn finish<T>(
    transfer: ScpTransfer<ssh2::Channel>,
    report: Result<T, ScpError>,
) -> Result<T, ScpError> {
    // A failed transfer leaves the channel mid-exchange, just drop it
    if report.is_err() || transfer.is_terminated() {
        return report;
    }
    let status = ScpClient::finish(transfer)?;
    info!("Remote scp exited with status {}", status);
    report
}

fn push(
    transfer: &mut ScpTransfer<ssh2::Channel>,
    local_paths: &[std::path::PathBuf],
    cli: &Cli,
) -> Result<TransferReport, ScpError> {
    let mut report = TransferReport::default();
    for path in local_paths {
        report.extend(push_path(transfer, path, cli)?);
    }
    Ok(report)
}

fn push_path(
    transfer: &mut ScpTransfer<ssh2::Channel>,
    path: &Path,
    cli: &Cli,
) -> Result<TransferReport, ScpError> {
    let mut report = TransferReport::default();
    let infos = match filesystem::file_infos(path, cli.preserve) {
        Ok(infos) => infos,
        Err(e) => {
            error!("Skipping {}: {}", path.display(), e);
            report.failed.push(failure(path, e));
            return Ok(report);
        }
    };

    if !path.is_dir() {
        let source = match filesystem::open_file(path) {
            Ok(file) => with_progress_reader(file, &infos, cli.progress),
            Err(e) => {
                report.failed.push(failure(path, e));
                return Ok(report);
            }
        };
        return transfer.upload_files([(infos, source)]);
    }

    if !cli.recursive {
        report.failed.push(failure(
            path,
            filesystem::local_error(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "is a directory, use -r"),
            ),
        ));
        return Ok(report);
    }

    match transfer.enter_directory(&infos) {
        Ok(()) => {}
        Err(e) if !e.is_session_fatal() => {
            report.failed.push(failure(path, e));
            return Ok(report);
        }
        Err(e) => return Err(e),
    }

    let entries = std::fs::read_dir(path).map_err(|e| filesystem::local_error(path, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| filesystem::local_error(path, e))?;
        report.extend(push_path(transfer, &entry.path(), cli)?);
    }

    transfer.exit_directory()?;
    Ok(report)
}

fn pull(
    transfer: &mut ScpTransfer<ssh2::Channel>,
    target: &Path,
    cli: &Cli,
) -> Result<TransferReport, ScpError> {
    let mut report = transfer.download(|infos| {
        let destination = filesystem::destination_path(target, infos);
        let file = filesystem::create_file(&destination)?;
        Ok(with_progress_writer(file, infos, cli.progress))
    })?;

    let mut applied = Vec::with_capacity(report.completed.len());
    for infos in report.completed.drain(..) {
        let destination = filesystem::destination_path(target, &infos);
        match filesystem::apply_metadata(&destination, &infos, cli.preserve) {
            Ok(()) => applied.push(infos),
            Err(e) => report.failed.push(failure(&destination, e)),
        }
    }
    report.completed = applied;
    Ok(report)
}

fn failure(path: &Path, error: ScpError) -> ferric_scp::scp::FileFailure {
    ferric_scp::scp::FileFailure {
        filename: path.display().to_string(),
        error,
    }
}

fn progress_printer(infos: &FileInfos) -> impl Fn(u64, usize) {
    let name = infos.filename.clone();
    let total = infos.size.max(1);
    move |transferred: u64, _: usize| {
        eprint!("\r{} {:>3}% ({} bytes)", name, transferred * 100 / total, transferred);
        if transferred >= total {
            eprintln!();
        }
    }
}

fn with_progress_reader<R: Read + 'static>(source: R, infos: &FileInfos, progress: bool) -> Box<dyn Read> {
    if progress {
        Box::new(ProgressStream::new(source, progress_printer(infos)))
    } else {
        Box::new(source)
    }
}

fn with_progress_writer<W: Write + 'static>(sink: W, infos: &FileInfos, progress: bool) -> Box<dyn Write> {
    if progress {
        Box::new(ProgressStream::new(sink, progress_printer(infos)))
    } else {
        Box::new(sink)
    }
}
