#![cfg(unix)]

//! End-to-end runs over real on-disk synapse directories: YAML configs,
//! shell-script neurons, and history persistence together.

use axoncore::{CoreError, ExecutionStatus, NeuronStatus, ValidationError};
use axonruntime::{load_synapse_dir, Executor, HistoryManager, OutputSink};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;

fn write_script(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

fn write_neuron(dir: &Path, name: &str, exec_file: &str) {
    let neurons = dir.join("neurons");
    std::fs::create_dir_all(&neurons).unwrap();
    std::fs::write(
        neurons.join(format!("{name}.yml")),
        format!("name: {name}\nexec_file: {exec_file}\npre_exec_debug: exciting {name}\n"),
    )
    .unwrap();
}

#[tokio::test]
async fn sequential_health_check_records_partial_history() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "ok.sh", "echo healthy\nexit 0");
    write_script(dir.path(), "bad.sh", "echo unwell >&2\nexit 1");
    write_neuron(dir.path(), "check-nginx", "./ok.sh");
    write_neuron(dir.path(), "check-database", "./ok.sh");
    write_neuron(dir.path(), "check-api", "./bad.sh");
    std::fs::write(
        dir.path().join("config.yml"),
        r#"
name: health-check
execution: sequential
stop_on_error: false
neurons:
  - name: check-nginx
  - name: check-database
  - name: check-api
"#,
    )
    .unwrap();

    let synapse = load_synapse_dir(dir.path()).unwrap();

    let history_dir = tempfile::tempdir().unwrap();
    let history = Arc::new(HistoryManager::new(history_dir.path()));
    let (sink, captured) = OutputSink::capture();
    let exec = Executor::new(Some(Arc::clone(&history)), sink);

    let record = exec.execute(&synapse, dir.path()).await.unwrap();

    assert_eq!(record.status, ExecutionStatus::Partial);
    assert_eq!(record.neuron_results.len(), 3);
    assert_eq!(record.neuron_results[0].status, NeuronStatus::Success);
    assert_eq!(record.neuron_results[0].stdout, "healthy\n");
    assert_eq!(record.neuron_results[2].status, NeuronStatus::Failed);
    assert_eq!(record.neuron_results[2].exit_code, 1);
    assert_eq!(record.neuron_results[2].stderr, "unwell\n");

    // Exactly one new record in history.
    let stored = history.get_history("health-check").unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, record.id);

    let out = captured.contents();
    assert!(out.contains("Executing: check-nginx"));
    assert!(out.contains("===> exciting check-nginx"));
}

#[tokio::test]
async fn parallel_run_completes_every_neuron() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "ok.sh", "exit 0");
    for name in ["prep-a", "prep-b", "combine"] {
        write_neuron(dir.path(), name, "./ok.sh");
    }
    std::fs::write(
        dir.path().join("config.yml"),
        r#"
name: fan-in
execution: parallel
max_concurrency: 2
neurons:
  - name: prep-a
  - name: prep-b
  - name: combine
    depends_on: [prep-a, prep-b]
"#,
    )
    .unwrap();

    let synapse = load_synapse_dir(dir.path()).unwrap();
    let (sink, captured) = OutputSink::capture();
    let exec = Executor::new(None, sink);

    let record = exec.execute(&synapse, dir.path()).await.unwrap();
    assert_eq!(record.status, ExecutionStatus::Success);
    assert_eq!(record.neuron_results.len(), 3);
    assert!(captured
        .contents()
        .contains("Executing in parallel (max concurrency: 2)"));
}

#[test]
fn cyclic_config_is_rejected_at_load_time() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.yml"),
        r#"
name: tangled
neurons:
  - name: a
    depends_on: [b]
  - name: b
    depends_on: [a]
"#,
    )
    .unwrap();

    let err = load_synapse_dir(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::CircularDependency { .. })
    ));
}

#[test]
fn missing_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_synapse_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound(_)));
}
