//! Orchestrator behavior driven through local (no-transport) execution.

use deckhand::session::{LocalExec, Session};
use deckhand::ErrorCode;

#[test]
fn nested_scopes_compose_outer_to_inner() {
    let session = Session::local();
    let _outer = session.cd("p1");
    let _inner = session.cd("p2");
    assert_eq!(session.compose("ls"), "cd p1 && (cd p2 && (ls))");
}

#[test]
fn scopes_do_not_leak_to_sibling_commands() {
    let session = Session::local();
    {
        let _guard = session.cd("/srv/app");
        assert_eq!(session.compose("ls"), "cd /srv/app && (ls)");
    }
    assert_eq!(session.compose("ls"), "ls");
}

#[test]
fn scope_released_even_when_body_errors() {
    let session = Session::local();
    let result: deckhand::Result<()> = (|| {
        let _guard = session.cd("/srv/app");
        session.run("exit 9")?;
        Ok(())
    })();
    assert!(result.is_err());
    // the guard dropped during unwind-free early return; no prefix remains
    assert_eq!(session.compose("ls"), "ls");
}

#[test]
fn environment_and_directory_scopes_stack() {
    let session = Session::local();
    let _env = session.prefix("source /envs/site/bin/activate");
    let _dir = session.cd("/srv/site/code");
    assert_eq!(
        session.compose("./manage.py syncdb"),
        "source /envs/site/bin/activate && (cd /srv/site/code && (./manage.py syncdb))"
    );
}

#[test]
fn tolerance_swallows_command_failure() {
    let session = Session::local();
    let _tolerant = session.tolerate_failures();
    let result = session.run("exit 42").expect("tolerated failure");
    assert!(!result.success);
    assert_eq!(result.exit_code, 42);
}

#[test]
fn failure_outside_tolerance_is_fatal() {
    let session = Session::local();
    let err = session.run("exit 42").unwrap_err();
    assert_eq!(err.code, ErrorCode::RemoteCommandFailed);
}

#[test]
fn tolerance_ends_with_its_scope() {
    let session = Session::local();
    {
        let _tolerant = session.tolerate_failures();
        assert!(session.run("false").is_ok());
    }
    let err = session.run("false").unwrap_err();
    assert_eq!(err.code, ErrorCode::RemoteCommandFailed);
}

#[test]
fn run_executes_inside_working_directory() {
    let session = Session::local();
    let dir = tempfile::tempdir().expect("tempdir");
    let dir_path = dir.path().to_string_lossy().to_string();

    let _guard = session.cd(&dir_path);
    session.run("touch marker").expect("touch");

    assert!(dir.path().join("marker").exists());
}

/// The deploy-shaped property: maintenance-up is tolerant, a later step
/// fails hard, and the remaining steps are never issued — the maintenance
/// marker stays in place.
#[test]
fn sequence_aborts_at_first_fatal_failure() {
    let session = Session::local();
    let dir = tempfile::tempdir().expect("tempdir");
    let dir_path = dir.path().to_string_lossy().to_string();

    let result: deckhand::Result<()> = (|| {
        let _dir = session.cd(&dir_path);

        // maintenance up: tolerant, first run has nothing to overwrite
        {
            let _tolerant = session.tolerate_failures();
            session.run("touch maintenance && exit 1")?;
        }

        session.run("false")?; // checkout fails
        session.run("touch gzip_ran")?; // never reached
        session.run("rm maintenance")?; // maintenance-down, never reached
        Ok(())
    })();

    let err = result.unwrap_err();
    assert_eq!(err.code, ErrorCode::RemoteCommandFailed);
    assert!(dir.path().join("maintenance").exists());
    assert!(!dir.path().join("gzip_ran").exists());
}

#[test]
fn local_runs_on_invoking_machine_with_context() {
    let session = Session::local();
    let _guard = session.cd("/");
    let result = session.local("pwd").expect("pwd");
    assert_eq!(result.stdout.trim(), "/");
}
