//! The readiness-driven network front-end: one thread, non-blocking
//! sockets, per-connection receive buffers, variable-length frame parsing
//! and dispatch into the world.
//!
//! The world lock is held only while a parsed frame mutates state, never
//! across a socket read or write.

use std::io::Read;
use std::net::TcpListener;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use glam::DVec3;

use trek::config::*;
use trek::entity::player::NavState;
use trek::wire::{
    self, PacketCommand, PacketHandshake, PacketLogin, PacketMessage, PKT_COMMAND, PKT_HANDSHAKE,
    PKT_LOGIN, PKT_MESSAGE, PKT_QUERY,
};
use trek::{broadcast, commands, crypto, persist};

use crate::state::{Shared, Writer};
use crate::tick::write_frame;

/// Inbound chat is capped well below the wire maximum.
const MAX_INBOUND_CHAT: usize = 4096;

struct Connection {
    writer: Writer,
    buf: Vec<u8>,
    session_key: Option<[u8; 32]>,
    slot: Option<usize>,
    peer: String,
}

enum Disposition {
    Keep,
    Close,
}

pub fn run(shared: Arc<Shared>, listener: TcpListener) -> Result<()> {
    listener
        .set_nonblocking(true)
        .context("listener non-blocking mode")?;

    let mut connections: Vec<Connection> = Vec::new();
    let mut scratch = [0u8; 16384];

    while shared.is_running() {
        // Accept everything pending.
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    if let Err(err) = stream.set_nonblocking(true) {
                        log::warn!("failed to configure socket from {addr}: {err}");
                        continue;
                    }
                    let _ = stream.set_nodelay(true);
                    log::info!("connection accepted from {addr}");
                    shared.connections_accepted.fetch_add(1, Ordering::Relaxed);
                    connections.push(Connection {
                        writer: Arc::new(Mutex::new(stream)),
                        buf: Vec::new(),
                        session_key: None,
                        slot: None,
                        peer: addr.to_string(),
                    });
                }
                Err(ref err) if err.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(err) => {
                    log::error!("accept failed: {err}");
                    break;
                }
            }
        }

        // Drain readable connections and parse complete frames.
        let mut closed: Vec<usize> = Vec::new();
        for (idx, conn) in connections.iter_mut().enumerate() {
            match pump(&shared, conn, &mut scratch) {
                Disposition::Keep => {}
                Disposition::Close => closed.push(idx),
            }
        }
        for idx in closed.into_iter().rev() {
            let conn = connections.swap_remove(idx);
            if let Some(slot) = conn.slot {
                shared.drop_link(slot);
            }
            log::info!("connection closed: {}", conn.peer);
        }

        std::thread::sleep(Duration::from_millis(1));
    }

    Ok(())
}

/// Read whatever the socket has, then parse and handle complete frames.
fn pump(shared: &Shared, conn: &mut Connection, scratch: &mut [u8]) -> Disposition {
    loop {
        let read = {
            let mut stream = conn.writer.lock().expect("writer lock");
            stream.read(scratch)
        };
        match read {
            Ok(0) => return Disposition::Close,
            Ok(n) => {
                shared.bytes_received.fetch_add(n as u64, Ordering::Relaxed);
                conn.buf.extend_from_slice(&scratch[..n]);
            }
            Err(ref err) if err.kind() == std::io::ErrorKind::WouldBlock => break,
            Err(err) => {
                log::debug!("read error from {}: {err}", conn.peer);
                return Disposition::Close;
            }
        }
    }

    loop {
        match wire::inbound_frame_len(&conn.buf) {
            Ok(None) => break,
            Ok(Some(len)) => {
                if conn.buf.len() < len {
                    break;
                }
                let frame: Vec<u8> = conn.buf.drain(..len).collect();
                match handle_frame(shared, conn, &frame) {
                    Disposition::Keep => {}
                    Disposition::Close => return Disposition::Close,
                }
            }
            Err(err) => {
                log::warn!("protocol violation from {}: {err}", conn.peer);
                return Disposition::Close;
            }
        }
    }
    Disposition::Keep
}

fn handle_frame(shared: &Shared, conn: &mut Connection, frame: &[u8]) -> Disposition {
    let tag = i32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]);
    match tag {
        PKT_HANDSHAKE => handshake(shared, conn, frame),
        PKT_QUERY => name_query(shared, conn, frame),
        PKT_LOGIN => login(shared, conn, frame),
        PKT_COMMAND => command(shared, conn, frame),
        PKT_MESSAGE => chat(shared, conn, frame),
        _ => Disposition::Close,
    }
}

fn handshake(shared: &Shared, conn: &mut Connection, frame: &[u8]) -> Disposition {
    let Ok(pkt) = PacketHandshake::decode(frame) else {
        return Disposition::Close;
    };
    match crypto::decode_hello(&pkt.pubkey[..crypto::HANDSHAKE_BODY_LEN], &shared.master_key) {
        Ok(session_key) => {
            conn.session_key = Some(session_key);
            log::debug!("session key negotiated for {}", conn.peer);
            let ack = PKT_HANDSHAKE.to_le_bytes();
            if write_frame(&conn.writer, &ack).is_err() {
                return Disposition::Close;
            }
            Disposition::Keep
        }
        Err(err) => {
            log::warn!("handshake rejected for {}: {err}", conn.peer);
            Disposition::Close
        }
    }
}

fn name_query(shared: &Shared, conn: &mut Connection, frame: &[u8]) -> Disposition {
    let Ok(pkt) = PacketLogin::decode(frame) else {
        return Disposition::Close;
    };
    let found = {
        let world = shared.world.lock().expect("world lock");
        i32::from(world.galaxy.player_slot_by_name(&pkt.name).is_some())
    };
    if write_frame(&conn.writer, &found.to_le_bytes()).is_err() {
        return Disposition::Close;
    }
    Disposition::Keep
}

fn login(shared: &Shared, conn: &mut Connection, frame: &[u8]) -> Disposition {
    let Ok(pkt) = PacketLogin::decode(frame) else {
        return Disposition::Close;
    };
    if pkt.name.is_empty() {
        return Disposition::Close;
    }

    let bootstrap = {
        let mut world = shared.world.lock().expect("world lock");

        let slot = match world
            .galaxy
            .player_slot_by_name(&pkt.name)
            .or_else(|| world.galaxy.free_player_slot())
        {
            Some(slot) => slot,
            None => {
                log::warn!("login refused for {}: server full", pkt.name);
                return Disposition::Close;
            }
        };

        let spawn = world.galaxy.random_safe_quadrant();
        let player = &mut world.galaxy.players[slot];
        let is_new = player.is_free_slot();
        if is_new {
            player.provision(&pkt.name, pkt.faction, pkt.ship_class, spawn);
        }

        // Every login: dilithium floor, clean transients, synced coordinates.
        player.inventory[trek::entity::player::resource::DILITHIUM] =
            player.inventory[trek::entity::player::resource::DILITHIUM].max(10);
        player.fx = Default::default();
        player.torpedo.active = false;
        player.outbox.clear();
        player.sync_derived_position();
        player.connected = true;
        player.active = false; // held until the bootstrap block is written

        conn.slot = Some(slot);
        if let Some(key) = conn.session_key {
            world.galaxy.players[slot].session_key = key;
        }
        log::info!(
            "captain {:?} bound to slot {slot} ({})",
            pkt.name,
            if is_new { "new" } else { "returning" }
        );
        (slot, is_new, persist::encode_master_sync(&world.galaxy))
    };
    let (slot, is_new, sync_bytes) = bootstrap;

    {
        let mut links = shared.links.lock().expect("links lock");
        links[slot] = Some(Arc::clone(&conn.writer));
    }
    if write_frame(&conn.writer, &sync_bytes).is_err() {
        return Disposition::Close;
    }
    shared
        .bytes_sent
        .fetch_add(sync_bytes.len() as u64, Ordering::Relaxed);

    // Activate, rescuing a dead or embedded ship first.
    let mut world = shared.world.lock().expect("world lock");
    let needs_rescue = {
        let trek::World { galaxy, index } = &*world;
        let player = &galaxy.players[slot];
        let mut rescue = player.energy <= 0 || player.crew_count <= 0;
        if player.quadrant.is_valid() {
            let cell = index.cell(player.quadrant);
            for s in cell.stars.iter() {
                if (player.sector - galaxy.stars[s].pos).length() < 1.0 {
                    rescue = true;
                }
            }
            for p in cell.planets.iter() {
                if (player.sector - galaxy.planets[p].pos).length() < 1.0 {
                    rescue = true;
                }
            }
        }
        rescue
    };

    if needs_rescue {
        let safe = world.galaxy.random_safe_quadrant();
        let player = &mut world.galaxy.players[slot];
        player.place_at(safe, DVec3::splat(5.0));
        player.energy = ENERGY_BASE_RECHARGE;
        player.torpedoes = MAX_TORPEDO_CAPACITY;
        player.crew_count = player.crew_count.max(100);
        player.system_health = [80.0; 8];
        player.nav_state = NavState::Idle;
        player.warp_speed = 0.0;
        player.dir = DVec3::ZERO;
        player.active = true;
        player.crypto_algo = trek::CipherAlgo::None;
        player.say(
            "STARFLEET",
            "EMERGENCY RESCUE: Your ship was recovered and towed to a safe quadrant.",
        );
    } else {
        let player = &mut world.galaxy.players[slot];
        player.active = true;
        player.crypto_algo = trek::CipherAlgo::None;
        let welcome = if is_new {
            "Welcome aboard, new Captain."
        } else {
            "Commander, welcome back."
        };
        player.say("SERVER", welcome);
    }

    Disposition::Keep
}

fn command(shared: &Shared, conn: &mut Connection, frame: &[u8]) -> Disposition {
    let Some(slot) = conn.slot else {
        return Disposition::Keep;
    };
    let Ok(pkt) = PacketCommand::decode(frame) else {
        return Disposition::Close;
    };

    let mut world = shared.world.lock().expect("world lock");
    if !world.galaxy.players[slot].active {
        return Disposition::Keep;
    }
    let trek::World { galaxy, index } = &mut *world;
    commands::dispatch(galaxy, index, slot, pkt.cmd.trim_end());
    Disposition::Keep
}

fn chat(shared: &Shared, conn: &mut Connection, frame: &[u8]) -> Disposition {
    let Some(_slot) = conn.slot else {
        return Disposition::Keep;
    };
    let Ok(mut pkt) = PacketMessage::decode(frame) else {
        return Disposition::Close;
    };
    if pkt.text.len() > MAX_INBOUND_CHAT {
        pkt.text.truncate(MAX_INBOUND_CHAT);
    }

    let deliveries = {
        let world = shared.world.lock().expect("world lock");
        broadcast::relay_chat(&world.galaxy, &pkt, &shared.master_key)
    };

    for (slot, message) in deliveries {
        let writer = shared.links.lock().expect("links lock")[slot].clone();
        if let Some(writer) = writer {
            let bytes = message.encode();
            if write_frame(&writer, &bytes).is_err() {
                shared.drop_link(slot);
            } else {
                shared
                    .bytes_sent
                    .fetch_add(bytes.len() as u64, Ordering::Relaxed);
            }
        }
    }
    Disposition::Keep
}

/// Bind the listening socket.
pub fn bind(bind_addr: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((bind_addr, port))
        .with_context(|| format!("cannot bind {bind_addr}:{port}"))
}
