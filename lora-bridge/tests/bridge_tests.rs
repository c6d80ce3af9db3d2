// LoRa Bridge - Integration Tests
//
// Gateway relay output fed straight into the bridge.

use approx::assert_relative_eq;
use lora_bridge::{BridgeStats, HostBridge};
use lora_gateway::GatewayRelay;
use lora_telemetry::{codec, LinkQuality, MemoryReceiver, Reading};
use serde_json::Value;

fn relay_output(packets: Vec<(Vec<u8>, LinkQuality)>) -> Vec<u8> {
    let mut receiver = MemoryReceiver::new();
    for (frame, link) in packets {
        receiver.push_incoming(frame, link);
    }
    let mut relay = GatewayRelay::new(receiver, Vec::new());
    relay.start().unwrap();
    relay.run().unwrap();
    relay.into_host()
}

fn records(sink: Vec<u8>) -> Vec<Value> {
    String::from_utf8(sink)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_gateway_stream_to_records() {
    let stream = relay_output(vec![
        (
            codec::encode(&Reading::new("SALA_SERVIDORES_01", 28.0, 45.0, 20.0)),
            LinkQuality::new(-42, 7.5),
        ),
        (
            codec::encode(&Reading::new("LABORATORIO_REDES", 24.37, 55.12, 33.9)),
            LinkQuality::new(-97, -3.2),
        ),
    ]);

    let mut bridge = HostBridge::new(Vec::new());
    let stats = bridge.run(stream.as_slice()).unwrap();
    assert_eq!(
        stats,
        BridgeStats {
            received: 2,
            accepted: 2,
            rejected: 0,
            forwarded: 2,
            failed: 0
        }
    );

    let out = records(bridge.into_sink());
    assert_eq!(out[0]["sensor_id"], "SALA_SERVIDORES_01");
    assert_eq!(out[0]["rssi"], -42);
    assert_relative_eq!(out[1]["temperatura"].as_f64().unwrap(), 24.37);
    assert_relative_eq!(out[1]["snr"].as_f64().unwrap(), -3.2);
    assert!(out[1]["received_at"].as_str().is_some());
}

#[test]
fn test_corrupted_records_filtered() {
    let stream = relay_output(vec![
        // Bit errors in the identifier
        (
            "{\"sensor_id\":\"SALA_SERV\u{00c9}DORES_01\",\"temperatura\":28.00,\"umidade\":45.00,\"poeira\":20.00}"
                .as_bytes()
                .to_vec(),
            LinkQuality::new(-119, -15.0),
        ),
        // Implausible temperature
        (
            codec::encode(&Reading::new("SALA_SERVIDORES_01", 128.0, 45.0, 20.0)),
            LinkQuality::new(-118, -14.5),
        ),
        (
            codec::encode(&Reading::new("SALA_SERVIDORES_02", 26.0, 50.0, 31.0)),
            LinkQuality::new(-80, 2.0),
        ),
    ]);

    let mut bridge = HostBridge::new(Vec::new());
    let stats = bridge.run(stream.as_slice()).unwrap();
    assert_eq!(stats.received, 3);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.rejected, 2);
    assert_eq!(stats.forwarded, 1);
    assert_relative_eq!(stats.success_rate().unwrap(), 100.0);

    let out = records(bridge.into_sink());
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["sensor_id"], "SALA_SERVIDORES_02");
}

#[test]
fn test_invalid_utf8_line_rejected_not_fatal() {
    let mut stream = b"DATA:{\"sensor_id\":\"\xff\xfe\",\"temperatura\":1,\"umidade\":1,\"poeira\":1}\n".to_vec();
    stream.extend_from_slice(b"DATA:{\"sensor_id\":\"B\",\"temperatura\":1,\"umidade\":1,\"poeira\":1}\n");

    let mut bridge = HostBridge::new(Vec::new());
    let stats = bridge.run(stream.as_slice()).unwrap();
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.rejected, 1);
}
