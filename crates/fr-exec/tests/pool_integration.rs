//! End-to-end tests of the execution pool over the scripted transport

use std::time::Duration;

use fr_core::{CommandOutcome, FleetCredentials, Host, KeySource, SessionError};
use fr_exec::scripted::{HostScript, ScriptedTransport};
use fr_exec::{
    CommandProtocol, DisplayOptions, EnsureDirectory, ExecutionPool, Policy, PolicyDriven,
};

fn credentials() -> FleetCredentials {
    FleetCredentials::new()
        .with_default_username("deploy")
        .with_default_key(KeySource::file("/keys/fleet"))
}

fn hosts(names: &[&str]) -> Vec<Host> {
    names.iter().map(|n| Host::new(*n)).collect()
}

fn slow_fleet(names: &[&str]) -> ScriptedTransport {
    names.iter().fold(ScriptedTransport::new(), |t, name| {
        t.host(*name, HostScript::reachable().delay(Duration::from_secs(10)))
    })
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_never_exceeds_bound() {
    let names = ["h1", "h2", "h3", "h4", "h5", "h6", "h7"];
    let transport = slow_fleet(&names);
    let stats = transport.stats();
    let pool = ExecutionPool::new(transport, credentials()).with_max_concurrency(3);

    let result = pool
        .run_commands(hosts(&names), &["one".to_string(), "two".to_string()], false)
        .await;

    assert_eq!(result.len(), names.len());
    assert!(result.success());
    assert_eq!(stats.max_active(), 3);
    assert_eq!(stats.connects(), names.len());
    assert_eq!(stats.closes(), names.len());
}

#[tokio::test(start_paused = true)]
async fn test_bound_larger_than_fleet() {
    let names = ["h1", "h2"];
    let transport = slow_fleet(&names);
    let stats = transport.stats();
    let pool = ExecutionPool::new(transport, credentials()).with_max_concurrency(10);

    let result = pool.run_command(hosts(&names), "uptime").await;

    assert_eq!(result.len(), 2);
    assert!(stats.max_active() <= 2);
}

#[tokio::test(start_paused = true)]
async fn test_sequential_with_bound_of_one() {
    let names = ["h1", "h2", "h3"];
    let transport = slow_fleet(&names);
    let stats = transport.stats();
    let pool = ExecutionPool::new(transport, credentials()).with_max_concurrency(0);

    let result = pool.run_command(hosts(&names), "uptime").await;

    assert_eq!(result.len(), 3);
    assert_eq!(stats.max_active(), 1);
}

#[tokio::test]
async fn test_stop_on_error_halts_after_failure() {
    let transport = ScriptedTransport::new().host(
        "a",
        HostScript::reachable().respond("second", CommandOutcome::new(2, "", "nope\n")),
    );
    let stats = transport.stats();
    let pool = ExecutionPool::new(transport, credentials());
    let commands: Vec<String> = ["first", "second", "third", "fourth"]
        .iter()
        .map(|c| c.to_string())
        .collect();

    let result = pool.run_commands(hosts(&["a"]), &commands, true).await;

    let a = result.get("a").unwrap();
    assert!(a.executed());
    assert_eq!(a.outcomes().len(), 2);
    assert_eq!(a.outcomes()[1].exit_code, Some(2));
    assert!(!a.success());
    assert_eq!(stats.commands("a"), vec!["first", "second"]);
}

#[tokio::test]
async fn test_without_stop_on_error_runs_everything() {
    let transport = ScriptedTransport::new().host(
        "a",
        HostScript::reachable().default_outcome(CommandOutcome::new(1, "", "")),
    );
    let pool = ExecutionPool::new(transport, credentials());
    let commands: Vec<String> = vec!["x".into(), "y".into(), "z".into()];

    let result = pool.run_commands(hosts(&["a"]), &commands, false).await;

    let a = result.get("a").unwrap();
    assert_eq!(a.outcomes().len(), 3);
    assert_eq!(a.to_string(), "Failed");
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let transport = ScriptedTransport::new().host(
        "a",
        HostScript::reachable()
            .respond("uname", CommandOutcome::new(0, "Linux\n", ""))
            .respond("false", CommandOutcome::new(1, "", "")),
    );
    let pool = ExecutionPool::new(transport, credentials());
    let commands: Vec<String> = vec!["uname".into(), "false".into()];

    let first = pool.run_commands(hosts(&["a"]), &commands, false).await;
    let second = pool.run_commands(hosts(&["a"]), &commands, false).await;

    let codes = |r: &fr_exec::FleetResult| -> Vec<Option<i32>> {
        r.get("a").unwrap().outcomes().iter().map(|o| o.exit_code).collect()
    };
    assert!(first.get("a").unwrap().executed());
    assert!(second.get("a").unwrap().executed());
    assert_eq!(codes(&first), codes(&second));
    assert_eq!(codes(&first), vec![Some(0), Some(1)]);
}

#[tokio::test]
async fn test_connection_drop_keeps_partial_outcomes() {
    let transport = ScriptedTransport::new().host("a", HostScript::reachable().drop_after(2));
    let pool = ExecutionPool::new(transport, credentials());
    let commands: Vec<String> = vec!["1".into(), "2".into(), "3".into(), "4".into()];

    let result = pool.run_commands(hosts(&["a"]), &commands, false).await;

    let a = result.get("a").unwrap();
    assert!(a.executed());
    assert_eq!(a.outcomes().len(), 2);
    assert!(a.error().is_none());
    assert!(a.is_interrupted());
    assert_eq!(a.to_string(), "Success (interrupted)");
}

#[tokio::test]
async fn test_reachable_and_unreachable_hosts() {
    let transport = ScriptedTransport::new().host(
        "A",
        HostScript::reachable().respond("echo 1", CommandOutcome::new(0, "1\n", "")),
    );
    let pool = ExecutionPool::new(transport, credentials()).with_max_concurrency(2);

    let result = pool.run_command(hosts(&["A", "B"]), "echo 1").await;

    let a = result.get("A").unwrap();
    assert!(a.executed());
    assert_eq!(a.outcomes(), &[CommandOutcome::new(0, "1\n", "")]);

    let b = result.get("B").unwrap();
    assert!(!b.executed());
    assert!(b.outcomes().is_empty());
    assert!(matches!(b.error(), Some(SessionError::Network(_))));

    assert!(!result.success());
    assert_eq!(result.failed_hosts(), vec!["B"]);

    let options = DisplayOptions {
        show_stdout: true,
        show_stderr: false,
        show_summary: false,
    };
    assert_eq!(
        result.display(&options),
        "A<<out>>: 1\nB: Error: network error: no route to host B:22\n"
    );
}

#[tokio::test]
async fn test_empty_command_list_connects_only() {
    let transport = ScriptedTransport::new().host("a", HostScript::reachable());
    let stats = transport.stats();
    let pool = ExecutionPool::new(transport, credentials());

    let result = pool.run_commands(hosts(&["a"]), &[], true).await;

    let a = result.get("a").unwrap();
    assert!(a.executed());
    assert!(a.outcomes().is_empty());
    assert!(result.success());
    assert_eq!(stats.connects(), 1);
    assert!(stats.commands("a").is_empty());
}

#[tokio::test]
async fn test_auth_failure_does_not_block_others() {
    let transport = ScriptedTransport::new()
        .host("locked", HostScript::reject_auth())
        .host("open", HostScript::reachable());
    let stats = transport.stats();
    let pool = ExecutionPool::new(transport, credentials()).with_max_concurrency(1);

    let result = pool.run_command(hosts(&["locked", "open"]), "true").await;

    assert!(matches!(
        result.get("locked").unwrap().error(),
        Some(SessionError::Auth(_))
    ));
    assert!(result.get("open").unwrap().success());
    assert_eq!(stats.connects(), 1);
    assert_eq!(stats.closes(), stats.connects());
}

#[tokio::test]
async fn test_ensure_directory_policy() {
    let transport = ScriptedTransport::new()
        .host(
            "present",
            HostScript::reachable().respond("stat '/srv/app'", CommandOutcome::new(0, "", "")),
        )
        .host(
            "absent",
            HostScript::reachable()
                .respond("stat '/srv/app'", CommandOutcome::new(1, "", "No such file\n")),
        );
    let stats = transport.stats();
    let pool = ExecutionPool::new(transport, credentials());

    let result = pool
        .run_policy(hosts(&["present", "absent"]), |_| EnsureDirectory::new("/srv/app"))
        .await;

    assert_eq!(stats.commands("present"), vec!["stat '/srv/app'"]);
    assert_eq!(
        stats.commands("absent"),
        vec!["stat '/srv/app'", "mkdir '/srv/app'"]
    );
    assert!(result.get("present").unwrap().success());
    // The failed stat is recorded, so the host reports Failed
    assert_eq!(result.get("absent").unwrap().outcomes().len(), 2);
}

#[tokio::test]
async fn test_closure_policy_per_host() {
    let transport = ScriptedTransport::new()
        .host("a", HostScript::reachable().respond("cat /etc/role", CommandOutcome::new(0, "db\n", "")))
        .host("b", HostScript::reachable().respond("cat /etc/role", CommandOutcome::new(0, "web\n", "")));
    let stats = transport.stats();
    let pool = ExecutionPool::new(transport, credentials());

    pool.run(hosts(&["a", "b"]), |_| {
        PolicyDriven::from_fn(|prev| match prev {
            None => vec!["cat /etc/role".into()],
            Some(o) if o.stdout.trim() == "db" => vec!["pg_isready".into()],
            Some(_) => vec![],
        })
        .into()
    })
    .await;

    assert_eq!(stats.commands("a"), vec!["cat /etc/role", "pg_isready"]);
    assert_eq!(stats.commands("b"), vec!["cat /etc/role"]);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_mid_run() {
    let names = ["h1", "h2", "h3", "h4"];
    let transport = ScriptedTransport::new();
    let transport = names.iter().fold(transport, |t, name| {
        t.host(*name, HostScript::reachable().delay(Duration::from_secs(60)))
    });
    let stats = transport.stats();
    let pool = ExecutionPool::new(transport, credentials()).with_max_concurrency(2);
    let token = pool.cancellation_token();

    let run = tokio::spawn(async move { pool.run_command(hosts(&names), "sleep 60").await });

    tokio::time::sleep(Duration::from_secs(1)).await;
    token.cancel();
    let result = run.await.unwrap();

    assert_eq!(result.len(), 4);
    for session in &result {
        assert!(!session.executed());
        assert_eq!(session.error(), Some(&SessionError::Cancelled));
    }
    assert_eq!(stats.connects(), 2);
    assert_eq!(stats.closes(), 2);
}

struct Exploding;

impl Policy for Exploding {
    fn decide(&mut self, _previous: Option<&CommandOutcome>) -> Vec<String> {
        panic!("policy blew up");
    }
}

#[tokio::test]
async fn test_panicking_session_is_recorded() {
    let transport = ScriptedTransport::new()
        .host("boom", HostScript::reachable())
        .host("fine", HostScript::reachable());
    let stats = transport.stats();
    let pool = ExecutionPool::new(transport, credentials());

    let result = pool
        .run(hosts(&["boom", "fine"]), |host| {
            if host.name == "boom" {
                CommandProtocol::policy(Exploding)
            } else {
                CommandProtocol::commands(["true"])
            }
        })
        .await;

    assert_eq!(result.len(), 2);
    assert!(matches!(
        result.get("boom").unwrap().error(),
        Some(SessionError::Unclassified(_))
    ));
    assert!(result.get("fine").unwrap().success());
    assert_eq!(stats.connects(), 2);
    assert_eq!(stats.closes(), stats.connects());
}
