// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end tests: a real hub and real agents talking over loopback TCP.

use std::time::Duration;

use pull_specs::{agent_config, free_port, wait_until, AgentProcess, HubProcess, SECRET};
use pullagent::session::SessionState;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;

const TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn trigger_collects_file_from_connected_agent() -> anyhow::Result<()> {
    let hub = HubProcess::start().await?;
    let source_dir = tempfile::tempdir()?;
    let source = source_dir.path().join("report.txt");
    let payload: Vec<u8> = (0..=255u8).cycle().take(200_000).collect();
    std::fs::write(&source, &payload)?;

    let agent = AgentProcess::start(&agent_config(hub.port, "a1", SECRET, source));
    wait_until(TIMEOUT, || async { hub.agents() == vec!["a1"] }).await?;
    assert_eq!(agent.state(), SessionState::Connected);

    let ack = hub.trigger().await?;
    assert_eq!(ack["message"], "trigger sent");
    assert_eq!(ack["addressed"], 1);

    let dest = hub.storage().join("received_a1.txt");
    wait_until(TIMEOUT, || async {
        std::fs::read(&dest).map(|got| got == payload).unwrap_or(false)
    })
    .await?;

    agent.stop().await?;
    wait_until(TIMEOUT, || async { hub.agents().is_empty() }).await?;
    hub.stop().await?;
    Ok(())
}

#[tokio::test]
async fn trigger_reaches_every_agent() -> anyhow::Result<()> {
    let hub = HubProcess::start().await?;
    let source_dir = tempfile::tempdir()?;
    let mut agents = Vec::new();
    for id in ["a1", "a2", "a3"] {
        let source = source_dir.path().join(format!("{id}.txt"));
        std::fs::write(&source, format!("contents of {id}"))?;
        agents.push(AgentProcess::start(&agent_config(hub.port, id, SECRET, source)));
    }
    wait_until(TIMEOUT, || async { hub.agents().len() == 3 }).await?;

    let ack = hub.trigger().await?;
    assert_eq!(ack["addressed"], 3);

    for id in ["a1", "a2", "a3"] {
        let dest = hub.storage().join(format!("received_{id}.txt"));
        let want = format!("contents of {id}");
        wait_until(TIMEOUT, || async {
            std::fs::read_to_string(&dest).map(|got| got == want).unwrap_or(false)
        })
        .await?;
    }
    Ok(())
}

#[tokio::test]
async fn agent_started_before_hub_connects_once_hub_is_up() -> anyhow::Result<()> {
    let port = free_port()?;
    let source_dir = tempfile::tempdir()?;
    let source = source_dir.path().join("late.txt");
    std::fs::write(&source, b"late hub")?;

    let agent = AgentProcess::start(&agent_config(port, "early", SECRET, source));
    let mut states = agent.states.clone();
    tokio::time::timeout(
        TIMEOUT,
        states.wait_for(|s| matches!(s, SessionState::Disconnected { failures } if *failures >= 2)),
    )
    .await??;

    let hub = HubProcess::start_on(port).await?;
    wait_until(TIMEOUT, || async { hub.agents() == vec!["early"] }).await?;

    hub.trigger().await?;
    let dest = hub.storage().join("received_early.txt");
    wait_until(TIMEOUT, || async {
        std::fs::read(&dest).map(|got| got == b"late hub").unwrap_or(false)
    })
    .await?;
    Ok(())
}

#[tokio::test]
async fn agent_with_wrong_secret_is_never_registered() -> anyhow::Result<()> {
    let hub = HubProcess::start().await?;
    let source_dir = tempfile::tempdir()?;
    let source = source_dir.path().join("x.txt");
    std::fs::write(&source, b"x")?;

    let agent = AgentProcess::start(&agent_config(hub.port, "intruder", "wrong", source));
    let mut states = agent.states.clone();
    tokio::time::timeout(
        TIMEOUT,
        states.wait_for(|s| matches!(s, SessionState::Disconnected { failures } if *failures >= 3)),
    )
    .await??;

    assert!(hub.agents().is_empty());
    let ack = hub.trigger().await?;
    assert_eq!(ack["addressed"], 0);
    Ok(())
}

#[tokio::test]
async fn reconnecting_agent_keeps_a_single_registration() -> anyhow::Result<()> {
    let hub = HubProcess::start().await?;
    let source_dir = tempfile::tempdir()?;
    let source = source_dir.path().join("dup.txt");
    std::fs::write(&source, b"second")?;

    let first = AgentProcess::start(&agent_config(hub.port, "dup", SECRET, source.clone()));
    wait_until(TIMEOUT, || async { hub.agents() == vec!["dup"] }).await?;

    // A second session with the same identity replaces the first handle.
    let second = AgentProcess::start(&agent_config(hub.port, "dup", SECRET, source));
    let mut states = first.states.clone();
    tokio::time::timeout(
        TIMEOUT,
        states.wait_for(|s| matches!(s, SessionState::Disconnected { .. })),
    )
    .await??;
    first.stop().await?;

    wait_until(TIMEOUT, || async {
        hub.agents() == vec!["dup"] && second.state() == SessionState::Connected
    })
    .await?;

    // The hub may still be closing the replaced channel; keep triggering until a file lands.
    let dest = hub.storage().join("received_dup.txt");
    wait_until(TIMEOUT, || async {
        match hub.trigger().await {
            Ok(ack) if ack["addressed"] == 1 => {}
            _ => return false,
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        std::fs::read(&dest).map(|got| got == b"second").unwrap_or(false)
    })
    .await?;
    Ok(())
}

#[tokio::test]
async fn stopped_agent_drops_out_of_registry() -> anyhow::Result<()> {
    let hub = HubProcess::start().await?;
    let source_dir = tempfile::tempdir()?;
    let source = source_dir.path().join("gone.txt");
    std::fs::write(&source, b"bye")?;

    let agent = AgentProcess::start(&agent_config(hub.port, "gone", SECRET, source));
    wait_until(TIMEOUT, || async { hub.agents() == vec!["gone"] }).await?;

    agent.stop().await?;
    wait_until(TIMEOUT, || async { hub.agents().is_empty() }).await?;
    let ack = hub.trigger().await?;
    assert_eq!(ack["addressed"], 0);
    Ok(())
}

#[tokio::test]
async fn dead_control_socket_is_evicted() -> anyhow::Result<()> {
    let hub = HubProcess::start().await?;

    let mut request = format!("ws://127.0.0.1:{}/ws", hub.port).into_client_request()?;
    request.headers_mut().insert("authorization", HeaderValue::from_str(&format!("Bearer {SECRET}"))?);
    request.headers_mut().insert("x-client-id", HeaderValue::from_static("raw"));
    let (socket, _) = tokio_tungstenite::connect_async(request).await?;
    wait_until(TIMEOUT, || async { hub.agents() == vec!["raw"] }).await?;

    // Drop the TCP connection without a close frame, then push a command at it.
    drop(socket);
    let _ = hub.trigger().await?;

    wait_until(TIMEOUT, || async { hub.agents().is_empty() }).await?;
    let ack = hub.trigger().await?;
    assert_eq!(ack["addressed"], 0);
    Ok(())
}
