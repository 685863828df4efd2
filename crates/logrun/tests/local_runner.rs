use std::path::Path;
use std::sync::{Arc, Mutex};

use logrun::exit_code::{EXIT_ERROR_EXECUTE, EXIT_OK};
use logrun::{Error, InputSource, LocalConfig, LogFn, OutputSink, Runner, log_fn, render};
use tokio::io::AsyncReadExt;

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    fn log_fn(&self) -> LogFn {
        let lines = Arc::clone(&self.0);
        log_fn(move |values| lines.lock().unwrap().push(render(values)))
    }

    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn local_runner() -> (Runner, Recorder) {
    let log = Recorder::default();
    let runner = Runner::local(LocalConfig {
        log_fn: Some(log.log_fn()),
        ..LocalConfig::default()
    });
    (runner, log)
}

#[tokio::test]
async fn test_run_true() {
    let (runner, log) = local_runner();

    let result = runner.run("/bin/true", &[]).await;

    assert_eq!(result.into_parts(), (String::new(), String::new(), EXIT_OK));
    assert_eq!(log.lines(), vec!["/bin/true"]);
}

#[tokio::test]
async fn test_run_captures_output() {
    let (runner, log) = local_runner();

    let result = runner.run("seq", &["1", "3"]).await;

    assert_eq!(result.stdout, "1\n2\n3\n");
    assert_eq!(result.stderr, "");
    assert_eq!(result.status, 0);
    assert_eq!(log.lines(), vec!["seq 1 3"]);
}

#[tokio::test]
async fn test_run_false() {
    let (runner, _) = local_runner();

    let result = runner.run("/bin/false", &[]).await;
    assert_eq!(result.status, 1);
    assert_eq!(result.stderr, "");
}

#[tokio::test]
async fn test_run_missing_program() {
    let (runner, log) = local_runner();

    let result = runner.run("/bin/xyzzy", &[]).await;

    assert_eq!(result.status, EXIT_ERROR_EXECUTE);
    assert_eq!(result.stdout, "");
    assert!(result.stderr.contains("failed to spawn process"));
    assert_eq!(log.lines(), vec!["/bin/xyzzy"]);

    let err = runner.try_run("/bin/xyzzy", &[]).await.unwrap_err();
    assert!(matches!(err, logrun::ExecError::SpawnError(_)));
}

#[tokio::test]
async fn test_shell_pipeline() {
    let (runner, log) = local_runner();

    let result = runner.shell("seq 1 3 | grep 2").await;

    assert_eq!(result.into_parts(), ("2\n".to_string(), String::new(), 0));
    assert_eq!(log.lines(), vec!["/bin/sh -c \"seq 1 3 | grep 2\""]);
}

#[tokio::test]
async fn test_shell_exit_status_and_stderr() {
    let (runner, _) = local_runner();

    let result = runner.shell("cd /bin && ls true xyzzy").await;

    assert_ne!(result.status, 0);
    assert_eq!(result.stdout, "true\n");
    assert!(result.stderr.contains("xyzzy"));
}

#[tokio::test]
async fn test_dryrun_never_executes() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");
    let log = Recorder::default();
    let runner = Runner::local(LocalConfig {
        log_fn: Some(log.log_fn()),
        dryrun: true,
        ..LocalConfig::default()
    });

    let touch = marker.display().to_string();
    for result in [
        runner.run("/usr/bin/touch", &[touch.as_str()]).await,
        runner.run("/bin/false", &[]).await,
        runner.run("/bin/xyzzy", &[]).await,
        runner.shell(&format!("echo hi > {touch}")).await,
    ] {
        assert_eq!(result.into_parts(), (String::new(), String::new(), EXIT_OK));
    }

    assert!(!marker.exists());
    assert_eq!(
        log.lines(),
        vec![
            format!("/usr/bin/touch {touch}"),
            "/bin/false".to_string(),
            "/bin/xyzzy".to_string(),
            format!("/bin/sh -c \"echo hi > {touch}\""),
        ]
    );
}

#[tokio::test]
async fn test_logged_line_matches_format() {
    let (runner, log) = local_runner();

    let formatted = runner.format_run("uname", &["-s"]);
    runner.run("uname", &["-s"]).await;
    let shell_formatted = runner.format_shell("uname -s");
    runner.shell("uname -s").await;

    assert_eq!(log.lines(), vec![formatted, shell_formatted]);
    assert_eq!(runner.format_run("uname", &["-s"]), "uname -s");
}

#[tokio::test]
async fn test_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("file");
    let empty = dir.path().join("empty");
    std::fs::write(&file, "content").unwrap();
    std::fs::write(&empty, "").unwrap();
    let (runner, log) = local_runner();

    assert!(runner.file_exists("/bin/sh").await.unwrap());
    assert!(runner.file_exists(file.to_str().unwrap()).await.unwrap());
    assert!(runner.file_exists(empty.to_str().unwrap()).await.unwrap());
    assert!(!runner.file_exists("/xyzzy").await.unwrap());
    assert!(matches!(
        runner.file_exists("/etc").await,
        Err(Error::NotAFile(_))
    ));

    assert_eq!(
        log.lines()[0],
        "/usr/bin/stat --dereference --format %n:%F /bin/sh"
    );
}

#[tokio::test]
async fn test_dir_exists() {
    let dir = tempfile::tempdir().unwrap();
    let link = dir.path().join("link");
    std::os::unix::fs::symlink(dir.path(), &link).unwrap();
    let (runner, _) = local_runner();

    assert!(runner.dir_exists(dir.path().to_str().unwrap()).await.unwrap());
    assert!(runner.dir_exists(link.to_str().unwrap()).await.unwrap());
    assert!(!runner.dir_exists("/xyzzy").await.unwrap());
    assert!(matches!(
        runner.dir_exists("/bin/sh").await,
        Err(Error::NotADirectory(_))
    ));
}

#[tokio::test]
async fn test_glob() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["alpha.txt", "beta.txt", "beta.txt-"] {
        std::fs::write(dir.path().join(name), "").unwrap();
    }
    let base = dir.path().display();
    let (runner, log) = local_runner();

    let single = runner.glob(&format!("{base}/alpha*")).await.unwrap();
    assert_eq!(single, vec![format!("{base}/alpha.txt")]);

    let multiple = runner.glob(&format!("{base}/beta*")).await.unwrap();
    assert_eq!(
        multiple,
        vec![format!("{base}/beta.txt"), format!("{base}/beta.txt-")]
    );

    let err = runner.glob(&format!("{base}/xy*zzy")).await.unwrap_err();
    assert!(matches!(err, Error::Glob { .. }));

    assert_eq!(
        log.lines()[0],
        format!("/bin/sh -c \"/bin/ls -1 --directory {base}/alpha*\"")
    );
}

#[tokio::test]
async fn test_glob_runs_in_dryrun() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("only"), "").unwrap();
    let (runner, _) = local_runner();
    runner.set_dryrun(true);

    let paths = runner
        .glob(&format!("{}/on*", dir.path().display()))
        .await
        .unwrap();
    assert_eq!(paths.len(), 1);
}

#[tokio::test]
async fn test_rsync_missing_source() {
    let dest = tempfile::tempdir().unwrap();
    let (runner, _) = local_runner();

    let result = runner
        .rsync("/bin/xyzzy", dest.path().to_str().unwrap())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_rsync_single_file() {
    if !Path::new(&logrun::CommandSettings::default().rsync.command).exists() {
        return;
    }
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    let file = src.path().join("payload");
    std::fs::write(&file, "data").unwrap();
    let (runner, _) = local_runner();

    runner
        .rsync(file.to_str().unwrap(), &format!("{}/", dest.path().display()))
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(dest.path().join("payload")).unwrap(),
        "data"
    );
}

#[tokio::test]
async fn test_environment_and_directory() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Runner::local(LocalConfig {
        env: vec!["GREETING=hello".into(), "GREETING=howdy".into()],
        dir: Some(dir.path().to_path_buf()),
        ..LocalConfig::default()
    });

    let result = runner.shell("echo $GREETING; /bin/pwd").await;

    let expected_dir = dir.path().canonicalize().unwrap();
    assert_eq!(
        result.stdout,
        format!("howdy\n{}\n", expected_dir.display())
    );
}

#[tokio::test]
async fn test_stdin_and_stdout_redirection() {
    let (client, mut server) = tokio::io::duplex(4096);
    let runner = Runner::local(LocalConfig {
        stdin: InputSource::Bytes(b"Hello World\n".to_vec()),
        stdout: OutputSink::writer(client),
        ..LocalConfig::default()
    });

    let result = runner.run("/usr/bin/tr", &["HW", "hw"]).await;
    assert_eq!(result.into_parts(), (String::new(), String::new(), 0));
    drop(runner);

    let mut received = String::new();
    server.read_to_string(&mut received).await.unwrap();
    assert_eq!(received, "hello world\n");
}

#[tokio::test]
async fn test_shared_writer_for_both_streams() {
    let (client, mut server) = tokio::io::duplex(4096);
    let sink = OutputSink::writer(client);
    let runner = Runner::local(LocalConfig {
        stdout: sink.clone(),
        stderr: sink,
        ..LocalConfig::default()
    });

    let result = runner.shell("echo out; echo err >&2").await;
    assert_eq!(result.stdout, "");
    assert_eq!(result.stderr, "");
    drop(runner);

    let mut received = String::new();
    server.read_to_string(&mut received).await.unwrap();
    let mut lines: Vec<&str> = received.lines().collect();
    lines.sort_unstable();
    assert_eq!(lines, vec!["err", "out"]);
}
