//! The 30 Hz simulation thread: absolute-time scheduling, the tick itself
//! under the world lock, then broadcast writes outside it.

use std::io::Write;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use trek::config::MAX_CLIENTS;
use trek::{broadcast, persist, TICK_INTERVAL};

use crate::state::{Shared, Writer};

pub fn run(shared: Arc<Shared>) {
    let mut deadline = Instant::now() + TICK_INTERVAL;
    while shared.is_running() {
        // Absolute schedule: late ticks are not replayed, the next deadline
        // just moves forward.
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        deadline += TICK_INTERVAL;

        tick_once(&shared);
    }

    // Final checkpoint on the way out.
    let world = shared.world.lock().expect("world lock");
    if let Err(err) = persist::save(&world.galaxy, &shared.data_path) {
        log::error!("shutdown checkpoint failed: {err}");
    }
}

fn tick_once(shared: &Shared) {
    let mut outbound: Vec<(usize, Vec<u8>)> = Vec::new();
    let mut snapshot_bytes: Option<Vec<u8>> = None;

    {
        let mut world = shared.world.lock().expect("world lock");
        let report = world.advance_tick();

        // Per-client snapshot, then the chat backlog, assembled while the
        // state is consistent; socket writes happen after unlock.
        for slot in 0..MAX_CLIENTS {
            if !world.galaxy.players[slot].connected {
                world.galaxy.players[slot].outbox.clear();
                continue;
            }
            {
                let trek::World { galaxy, index } = &mut *world;
                let update = broadcast::build_update(galaxy, index, slot);
                outbound.push((slot, update.encode()));
            }

            let notes = std::mem::take(&mut world.galaxy.players[slot].outbox);
            for note in notes {
                let packet = broadcast::note_packet(
                    &world.galaxy,
                    slot,
                    &note.from,
                    &note.text,
                    &shared.master_key,
                    &shared.signing,
                );
                outbound.push((slot, packet.encode()));
            }
        }

        if report.checkpoint {
            snapshot_bytes = Some(persist::encode_galaxy(&world.galaxy));
        }
    }

    for (slot, bytes) in outbound {
        let writer = shared.links.lock().expect("links lock")[slot].clone();
        if let Some(writer) = writer {
            if write_frame(&writer, &bytes).is_err() {
                shared.drop_link(slot);
            } else {
                shared
                    .bytes_sent
                    .fetch_add(bytes.len() as u64, Ordering::Relaxed);
            }
        }
    }

    if let Some(bytes) = snapshot_bytes {
        match std::fs::write(&shared.data_path, &bytes) {
            Ok(()) => log::info!("galaxy checkpoint written ({} bytes)", bytes.len()),
            Err(err) => log::error!("galaxy checkpoint failed: {err}"),
        }
    }
}

pub fn write_frame(writer: &Writer, bytes: &[u8]) -> std::io::Result<()> {
    let mut stream = writer.lock().expect("writer lock");
    stream.write_all(bytes)
}
