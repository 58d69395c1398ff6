//! Tests for the persistent session against a real `/bin/sh`.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::ShellSession;
use crate::config::ShellConfig;
use crate::context::{CapturedOutput, CommandRecord, Console, OutputVisibility, snapshot};
use crate::error::ShellError;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn sh_config() -> ShellConfig {
    ShellConfig {
        program: "/bin/sh".to_string(),
        ..ShellConfig::default()
    }
}

async fn started(config: ShellConfig) -> Result<(ShellSession, CapturedOutput), ShellError> {
    let (console, captured) = Console::capture();
    let mut session = ShellSession::new(config).with_console(console);
    session.acquire().await?;
    Ok((session, captured))
}

#[tokio::test]
async fn test_returns_exact_output() -> TestResult {
    let (mut session, _) = started(sh_config()).await?;

    assert_eq!(session.execute("echo hello").await?, "hello");
    assert_eq!(
        session.execute("printf 'a\\nb\\n\\nc\\n'").await?,
        "a\nb\n\nc"
    );
    // no trailing newline: the blank echo keeps the frame on its own line
    assert_eq!(session.execute("printf abc").await?, "abc");

    session.release().await;
    Ok(())
}

#[tokio::test]
async fn test_output_never_contains_frame() -> TestResult {
    let (mut session, _) = started(sh_config()).await?;
    let marker = session
        .marker()
        .map(|m| m.as_str().to_string())
        .ok_or("no marker")?;

    for command in ["echo one", "true", "ls /", "echo two 1>&2"] {
        let output = session.execute(command).await?;
        assert!(!output.contains(&marker), "{command} leaked the frame");
    }

    session.release().await;
    Ok(())
}

#[tokio::test]
async fn test_stale_frame_text_is_plain_output() -> TestResult {
    let (mut session, _) = started(sh_config()).await?;
    let marker = session.marker().cloned().ok_or("no marker")?;

    // first call uses sequence 1; echo a copy of it during the second call
    session.execute("true").await?;
    let stale = format!("{}:1:0", marker.as_str());
    let output = session.execute(&format!("echo '{stale}'; echo after")).await?;
    assert_eq!(output, format!("{stale}\nafter"));

    session.release().await;
    Ok(())
}

#[tokio::test]
async fn test_stderr_is_merged() -> TestResult {
    let (mut session, _) = started(sh_config()).await?;

    assert_eq!(session.execute("echo oops 1>&2").await?, "oops");
    let output = session.execute("ls /definitely/not/here").await?;
    assert!(output.contains("/definitely/not/here"));

    session.release().await;
    Ok(())
}

#[tokio::test]
async fn test_exit_status_reported() -> TestResult {
    let (mut session, _) = started(sh_config()).await?;

    let ok = session.run("true").await?;
    assert_eq!(ok.exit_status, Some(0));
    assert!(ok.success());

    assert_eq!(session.run("false").await?.exit_status, Some(1));
    assert_eq!(session.run("(exit 3)").await?.exit_status, Some(3));

    session.release().await;
    Ok(())
}

#[tokio::test]
async fn test_trailing_continuation_keeps_framing_intact() -> TestResult {
    let (mut session, _) = started(sh_config()).await?;

    session.execute("false").await?;
    let run = session.run("echo a \\").await?;
    assert_eq!(run.output, "a");
    assert_eq!(run.exit_status, Some(0));

    session.release().await;
    Ok(())
}

#[tokio::test]
async fn test_status_variable_not_left_in_shell() -> TestResult {
    let (mut session, _) = started(sh_config()).await?;

    session.execute("false").await?;
    assert_eq!(
        session
            .execute("echo \"${__agent_shell_status-none}\"")
            .await?,
        "none"
    );
    assert!(!session.execute("set").await?.contains("__agent_shell_status"));

    session.release().await;
    Ok(())
}

#[tokio::test]
async fn test_working_directory_persists() -> TestResult {
    let dir = tempfile::tempdir()?;
    let start = dir.path().join("start");
    std::fs::create_dir(&start)?;
    let config = ShellConfig {
        cwd: Some(start.clone()),
        ..sh_config()
    };
    let (mut session, _) = started(config).await?;

    let d0 = session.execute("pwd").await?;
    assert_eq!(PathBuf::from(&d0), start);

    session.execute("cd ..").await?;
    let d1 = session.execute("pwd").await?;
    assert_ne!(d1, d0);

    session.execute(&format!("cd '{d0}'")).await?;
    assert_eq!(session.execute("pwd").await?, d0);

    // lost after a restart
    session.execute("cd /").await?;
    session.restart().await?;
    assert_eq!(session.execute("pwd").await?, d0);

    session.release().await;
    Ok(())
}

#[tokio::test]
async fn test_shell_variables_persist() -> TestResult {
    let (mut session, _) = started(sh_config()).await?;

    session.execute("GREETING=hi; export TARGET=world").await?;
    assert_eq!(session.execute("echo \"$GREETING $TARGET\"").await?, "hi world");

    session.release().await;
    Ok(())
}

#[tokio::test]
async fn test_history_records_each_call_in_order() -> TestResult {
    let (mut session, _) = started(sh_config()).await?;
    let log = session.command_log();

    session.execute("echo a").await?;
    session.execute("true").await?;
    session.execute("echo b 1>&2").await?;

    assert_eq!(
        snapshot(&log),
        vec![
            CommandRecord::new("echo a", "a"),
            CommandRecord::new("true", ""),
            CommandRecord::new("echo b 1>&2", "b"),
        ]
    );

    crate::context::clear(&log);
    assert!(snapshot(&log).is_empty());
    session.execute("echo c").await?;
    assert_eq!(snapshot(&log), vec![CommandRecord::new("echo c", "c")]);

    session.release().await;
    Ok(())
}

#[tokio::test]
async fn test_visibility_only_changes_echo() -> TestResult {
    let visibility = OutputVisibility::new(false);
    let (console, captured) = Console::capture();
    let mut session = ShellSession::new(sh_config())
        .with_console(console)
        .with_visibility(visibility.clone());
    session.acquire().await?;

    let quiet = session.execute("echo line1; echo line2").await?;
    assert_eq!(captured.contents(), "$ echo line1; echo line2\n");

    assert!(visibility.toggle());
    let loud = session.execute("echo line1; echo line2").await?;
    assert_eq!(quiet, loud);

    let console_text = captured.contents();
    assert!(console_text.ends_with("$ echo line1; echo line2\nline1\nline2\n\n"));
    assert!(!console_text.contains("__AGENT_SHELL_EOF_"));

    session.release().await;
    Ok(())
}

#[tokio::test]
async fn test_visibility_change_applies_to_next_line() -> TestResult {
    let visibility = OutputVisibility::new(true);
    let (console, captured) = Console::capture();
    let mut session = ShellSession::new(sh_config())
        .with_console(console)
        .with_visibility(visibility.clone());
    session.acquire().await?;

    let command = "echo first; sleep 1; echo second";
    let (output, ()) = tokio::join!(session.execute(command), async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        visibility.set(false);
    });
    assert_eq!(output?, "first\nsecond");
    assert_eq!(captured.contents(), format!("$ {command}\nfirst\n"));

    session.release().await;
    Ok(())
}

#[tokio::test]
async fn test_double_acquire_rejected() -> TestResult {
    let (mut session, _) = started(sh_config()).await?;
    let pid = session.pid();

    let err = session.acquire().await.err();
    assert!(matches!(err, Some(ShellError::AlreadyAcquired)));
    assert_eq!(session.pid(), pid);
    assert_eq!(session.execute("echo still").await?, "still");

    session.release().await;
    assert!(!session.is_acquired());
    Ok(())
}

#[tokio::test]
async fn test_spawn_failure() {
    let mut session = ShellSession::new(ShellConfig {
        program: "/nonexistent/interpreter".to_string(),
        ..ShellConfig::default()
    })
    .with_console(Console::capture().0);

    let err = session.acquire().await.err();
    assert!(matches!(err, Some(ShellError::ProcessSpawn { .. })));
    assert!(!session.is_acquired());
}

#[tokio::test]
async fn test_execute_without_acquire() {
    let mut session = ShellSession::new(sh_config()).with_console(Console::capture().0);
    let err = session.execute("echo hi").await.err();
    assert!(matches!(err, Some(ShellError::NotAcquired)));
    assert!(snapshot(&session.command_log()).is_empty());
}

#[tokio::test]
async fn test_release_after_execution_error() -> TestResult {
    let (mut session, _) = started(sh_config()).await?;
    let log = session.command_log();

    let err = session.execute("exit").await.err();
    assert!(matches!(err, Some(ShellError::Execution { .. })));
    assert!(snapshot(&log).is_empty());

    let err = session.execute("echo again").await.err();
    assert!(matches!(err, Some(ShellError::Desynced)));

    session.release().await;
    assert!(!session.is_acquired());

    session.acquire().await?;
    assert_eq!(session.execute("echo back").await?, "back");
    session.release().await;
    Ok(())
}

#[tokio::test]
async fn test_release_is_idempotent() -> TestResult {
    let (mut session, _) = started(sh_config()).await?;
    session.release().await;
    session.release().await;
    assert!(!session.is_acquired());
    Ok(())
}

#[tokio::test]
async fn test_cancel_aborts_hung_command() -> TestResult {
    let (mut session, _) = started(sh_config()).await?;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let began = Instant::now();
    let err = session.run_with_cancel("sleep 30", &cancel).await.err();
    assert!(matches!(err, Some(ShellError::Cancelled { .. })));
    assert!(began.elapsed() < Duration::from_secs(10));
    assert!(session.is_desynced());

    session.restart().await?;
    assert_eq!(session.execute("echo recovered").await?, "recovered");
    session.release().await;
    Ok(())
}

#[tokio::test]
async fn test_timeout_bounds_command() -> TestResult {
    let config = ShellConfig {
        command_timeout_secs: Some(1),
        ..sh_config()
    };
    let (mut session, _) = started(config).await?;

    assert_eq!(session.execute("echo quick").await?, "quick");
    let err = session.execute("sleep 30").await.err();
    assert!(matches!(err, Some(ShellError::Timeout { .. })));
    assert!(err.is_some_and(|e| e.needs_restart()));

    let began = Instant::now();
    session.release().await;
    assert!(began.elapsed() < Duration::from_secs(5));
    Ok(())
}

#[tokio::test]
async fn test_release_waits_once_for_busy_interpreter() -> TestResult {
    let config = ShellConfig {
        release_timeout_ms: 1000,
        ..sh_config()
    };
    let (mut session, _) = started(config).await?;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });
    let err = session.run_with_cancel("sleep 30", &cancel).await.err();
    assert!(matches!(err, Some(ShellError::Cancelled { .. })));

    // the interpreter is still inside `sleep`, so only the kill ends it
    let began = Instant::now();
    session.release().await;
    assert!(began.elapsed() < Duration::from_millis(1000));
    assert!(!session.is_acquired());
    Ok(())
}
