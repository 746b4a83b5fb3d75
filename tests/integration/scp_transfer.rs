use super::test_utils::{source_script, ScriptedRemote};
use ferric_scp::scp::{
    Context, FileInfos, ProgressStream, Response, ResponseType, ScpError, ScpTransfer,
};
use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Clone, Default)]
struct Collected(Rc<RefCell<Vec<u8>>>);

impl std::io::Write for Collected {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_download_with_preserved_times() {
    let script = source_script("a.txt", "0644", b"hello", Some((1610000000, 1609999000)));
    let mut transfer = ScpTransfer::new(ScriptedRemote::new(&script), Context::background());
    let sink = Collected::default();

    let report = transfer.download(|_| Ok(sink.clone())).unwrap();

    let infos = &report.completed[0];
    assert_eq!(infos.access_time, 1610000000);
    assert_eq!(infos.modify_time, 1609999000);
    assert_eq!(infos.filename, "a.txt");
    assert_eq!(infos.size, 5);
    assert_eq!(sink.0.borrow().as_slice(), b"hello");
}

#[test]
fn test_download_progress_counts_payload_only() {
    let payload = vec![7u8; 100_000];
    let script = source_script("blob.bin", "0600", &payload, None);
    let mut transfer = ScpTransfer::new(ScriptedRemote::new(&script), Context::background());
    let events: Rc<RefCell<Vec<(u64, usize)>>> = Rc::default();

    let observed = events.clone();
    let report = transfer
        .download(move |_| {
            let observed = observed.clone();
            Ok(ProgressStream::new(Collected::default(), move |total: u64, delta: usize| {
                observed.borrow_mut().push((total, delta))
            }))
        })
        .unwrap();

    assert_eq!(report.bytes(), 100_000);
    let events = events.borrow();
    assert!(events.len() > 1);
    assert_eq!(events.last().map(|e| e.0), Some(100_000));
    assert_eq!(events.iter().map(|e| e.1).sum::<usize>(), 100_000);
}

#[test]
fn test_upload_then_sink_sees_directive_and_terminator() {
    let mut transfer = ScpTransfer::new(ScriptedRemote::new(&[0, 0]), Context::background());
    let infos = FileInfos::new("test.txt", "0644", 0);

    transfer.upload_file(&infos, Cursor::new(Vec::new())).unwrap();

    let mut sent = Cursor::new(transfer.into_inner().outgoing);
    let directive = Response::parse(&mut sent).unwrap();
    assert!(directive.is_permission());
    let parsed = directive.parse_file_infos().unwrap();
    assert_eq!(parsed.filename, "test.txt");
    assert_eq!(parsed.permissions, "0644");
    assert_eq!(parsed.size, 0);

    let terminator = Response::parse(&mut sent).unwrap();
    assert!(terminator.is_ok());
    assert_eq!(sent.position() as usize, sent.get_ref().len());
}

#[test]
fn test_remote_error_mid_upload_stops_the_batch() {
    let mut transfer = ScpTransfer::new(
        ScriptedRemote::new(b"\x00\x00\x02no space left\n"),
        Context::background(),
    );
    let files = vec![
        (FileInfos::new("one.txt", "0644", 3), Cursor::new(b"one".to_vec())),
        (FileInfos::new("two.txt", "0644", 3), Cursor::new(b"two".to_vec())),
        (FileInfos::new("three.txt", "0644", 5), Cursor::new(b"three".to_vec())),
    ];

    match transfer.upload_files(files) {
        Err(ScpError::RemoteFailure { kind, message }) => {
            assert_eq!(kind, ResponseType::Error);
            assert_eq!(message, "no space left\n");
        }
        other => panic!("Expected remote failure, got {:?}", other),
    }
    assert!(transfer.is_terminated());
    assert_eq!(
        transfer.into_inner().outgoing,
        b"C0644 3 one.txt\none\x00C0644 3 two.txt\n".to_vec()
    );
}

#[test]
fn test_cancel_during_payload() {
    let ctx = Context::background();
    let handle = ctx.cancel_handle();
    let mut transfer = ScpTransfer::new(ScriptedRemote::new(&[0, 0]), ctx);
    let infos = FileInfos::new("big.bin", "0644", 200_000);

    let source = ProgressStream::new(Cursor::new(vec![1u8; 200_000]), move |_: u64, _: usize| {
        handle.cancel()
    });
    let err = transfer.upload_file(&infos, source).unwrap_err();

    assert!(matches!(err, ScpError::Cancelled));
    assert!(transfer.is_terminated());
    let sent = transfer.into_inner().outgoing;
    assert!(sent.len() < "C0644 200000 big.bin\n".len() + 200_000);
}

#[test]
fn test_independent_sessions_in_parallel() {
    let results = Arc::new(Mutex::new(Vec::new()));
    let workers: Vec<_> = (0..4)
        .map(|i| {
            let results = Arc::clone(&results);
            thread::spawn(move || {
                let name = format!("file{}.txt", i);
                let payload = name.repeat(100).into_bytes();
                let script = source_script(&name, "0644", &payload, None);
                let mut transfer =
                    ScpTransfer::new(ScriptedRemote::new(&script), Context::background());

                let report = transfer.download(|_| Ok(Vec::new())).unwrap();
                results
                    .lock()
                    .unwrap()
                    .push((report.completed[0].filename.clone(), report.bytes()));
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let mut results = results.lock().unwrap().clone();
    results.sort();
    assert_eq!(results.len(), 4);
    assert_eq!(results[0], ("file0.txt".to_string(), 900));
}
