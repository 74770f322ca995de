//! Outbound state assembly: the per-client update packet built each tick,
//! and chat packet construction (server notices and player relay) with
//! per-recipient sealing.

use ed25519_dalek::SigningKey;

use crate::config::*;
use crate::crypto::{self, CipherAlgo};
use crate::entity::id;
use crate::entity::{kind, species_name};
use crate::galaxy::index::SpatialIndex;
use crate::galaxy::Galaxy;
use crate::wire::{
    NetBeam, NetDismantle, NetObject, NetPoint, PacketMessage, PacketUpdate, SCOPE_FACTION,
    SCOPE_PRIVATE,
};

fn net_point(pos: glam::DVec3, active: bool) -> NetPoint {
    NetPoint {
        x: pos.x as f32,
        y: pos.y as f32,
        z: pos.z as f32,
        active: i32::from(active),
    }
}

/// Build one player's snapshot for this tick and clear the one-shot
/// transient effects it carries.
pub fn build_update(galaxy: &mut Galaxy, index: &SpatialIndex, slot: usize) -> PacketUpdate {
    let mut upd = PacketUpdate {
        frame_id: galaxy.master.frame_id,
        ..PacketUpdate::default()
    };

    {
        let player = &galaxy.players[slot];
        upd.q = [player.quadrant.q1, player.quadrant.q2, player.quadrant.q3];
        upd.s = [
            player.sector.x as f32,
            player.sector.y as f32,
            player.sector.z as f32,
        ];
        upd.ent_h = player.heading as f32;
        upd.ent_m = player.mark as f32;
        upd.energy = player.energy;
        upd.torpedoes = player.torpedoes;
        upd.cargo_energy = player.cargo_energy;
        upd.cargo_torpedoes = player.cargo_torpedoes;
        upd.crew_count = player.crew_count;
        upd.shields = player.shields;
        for (dst, src) in upd.inventory.iter_mut().zip(player.inventory.iter()) {
            *dst = *src;
        }
        for (dst, src) in upd.system_health.iter_mut().zip(player.system_health.iter()) {
            *dst = *src;
        }
        upd.power_dist = player.power_dist;
        upd.life_support = player.life_support;
        upd.corbomite_count = player.corbomite_count;
        upd.lock_target = player.lock_target;
        upd.tube_state = player.torpedo.load_timer;
        upd.phaser_charge = player.system_health[crate::entity::player::system::PHASERS];
        upd.is_cloaked = u8::from(player.cloaked);
        upd.encryption_enabled = player.crypto_algo as u8;

        // Slot 0 of the trailer is always the player's own ship.
        upd.objects.push(NetObject {
            x: player.sector.x as f32,
            y: player.sector.y as f32,
            z: player.sector.z as f32,
            h: player.heading as f32,
            m: player.mark as f32,
            kind: kind::PLAYER,
            ship_class: player.ship_class,
            active: 1,
            health_pct: (player.energy as f64 / 1_000_000.0 * 100.0) as i32,
            id: id::player_id(slot),
            name: player.name.clone(),
        });
    }

    fill_visible_objects(galaxy, index, slot, &mut upd);

    {
        let player = &galaxy.players[slot];
        upd.beam_count = player.fx.beam_count as i32;
        for (dst, src) in upd.beams.iter_mut().zip(player.fx.beams.iter()) {
            *dst = NetBeam {
                tx: src.target.x as f32,
                ty: src.target.y as f32,
                tz: src.target.z as f32,
                active: src.tag,
            };
        }

        upd.torp = net_point(player.fx.torp.pos, player.fx.torp.active);
        upd.boom = net_point(player.fx.boom.pos, player.fx.boom.active);
        upd.wormhole = net_point(player.fx.wormhole.pos, player.fx.wormhole.active);
        upd.jump_arrival = net_point(player.fx.jump_arrival.pos, player.fx.jump_arrival.active);
        upd.dismantle = NetDismantle {
            x: player.fx.dismantle.pos.x as f32,
            y: player.fx.dismantle.pos.y as f32,
            z: player.fx.dismantle.pos.z as f32,
            species: player.fx.dismantle.species,
            active: i32::from(player.fx.dismantle.active),
        };
    }

    // Map synchronizer: an active supernova preempts the local census cell.
    if galaxy.supernova.timer > 0 {
        let sq = galaxy.supernova.quadrant;
        upd.map_update_q = [sq.q1, sq.q2, sq.q3];
        upd.map_update_val = -(galaxy.supernova.timer as i64);
        upd.supernova_q = [sq.q1, sq.q2, sq.q3];
        upd.supernova_pos = NetPoint {
            x: galaxy.supernova.epicenter.x as f32,
            y: galaxy.supernova.epicenter.y as f32,
            z: galaxy.supernova.epicenter.z as f32,
            // The timer rides in the activity field.
            active: galaxy.supernova.timer,
        };
    } else {
        upd.map_update_q = upd.q;
        upd.map_update_val = galaxy.master.census(galaxy.players[slot].quadrant);
    }

    galaxy.players[slot].fx.clear_after_send();
    upd
}

/// Fill the object trailer from the viewer's current quadrant, truncating
/// when the 128-slot trailer fills.
fn fill_visible_objects(
    galaxy: &Galaxy,
    index: &SpatialIndex,
    viewer: usize,
    upd: &mut PacketUpdate,
) {
    let viewer_faction = galaxy.players[viewer].faction;
    let q = galaxy.players[viewer].quadrant;
    if !q.is_valid() {
        return;
    }
    let cell = index.cell(q);
    let full = |upd: &PacketUpdate| upd.objects.len() >= MAX_NET_OBJECTS;

    for j in cell.players.iter() {
        if j == viewer || full(upd) {
            continue;
        }
        let p = &galaxy.players[j];
        if !p.active || (p.cloaked && p.faction != viewer_faction) {
            continue;
        }
        upd.objects.push(NetObject {
            x: p.sector.x as f32,
            y: p.sector.y as f32,
            z: p.sector.z as f32,
            h: p.heading as f32,
            m: p.mark as f32,
            kind: kind::PLAYER,
            ship_class: p.ship_class,
            active: 1,
            health_pct: (p.energy as f64 / 1_000_000.0 * 100.0) as i32,
            id: id::player_id(j),
            name: p.name.clone(),
        });
    }

    for n in cell.npcs.iter() {
        if full(upd) {
            break;
        }
        let npc = &galaxy.npcs[n];
        if !npc.active {
            continue;
        }
        upd.objects.push(NetObject {
            x: npc.pos.x as f32,
            y: npc.pos.y as f32,
            z: npc.pos.z as f32,
            h: npc.heading as f32,
            m: npc.mark as f32,
            kind: npc.faction,
            ship_class: 0,
            active: 1,
            health_pct: (npc.energy as f32 / npc.max_energy() as f32 * 100.0) as i32,
            id: id::npc_id(n),
            name: species_name(npc.faction).to_string(),
        });
    }

    for p in cell.planets.iter() {
        if full(upd) {
            break;
        }
        let planet = &galaxy.planets[p];
        upd.objects.push(NetObject {
            x: planet.pos.x as f32,
            y: planet.pos.y as f32,
            z: planet.pos.z as f32,
            kind: kind::PLANET,
            ship_class: planet.resource_type,
            active: 1,
            health_pct: 100,
            id: planet.id + id::PLANET_BASE,
            name: "Planet".to_string(),
            ..NetObject::default()
        });
    }
    for s in cell.stars.iter() {
        if full(upd) {
            break;
        }
        let star = &galaxy.stars[s];
        upd.objects.push(NetObject {
            x: star.pos.x as f32,
            y: star.pos.y as f32,
            z: star.pos.z as f32,
            kind: kind::STAR,
            ship_class: star.id % 7,
            active: 1,
            health_pct: 100,
            id: star.id + id::STAR_BASE,
            name: "Star".to_string(),
            ..NetObject::default()
        });
    }
    for h in cell.black_holes.iter() {
        if full(upd) {
            break;
        }
        let hole = &galaxy.black_holes[h];
        upd.objects.push(NetObject {
            x: hole.pos.x as f32,
            y: hole.pos.y as f32,
            z: hole.pos.z as f32,
            kind: kind::BLACK_HOLE,
            active: 1,
            health_pct: 100,
            id: hole.id + id::BLACK_HOLE_BASE,
            name: "Black Hole".to_string(),
            ..NetObject::default()
        });
    }
    for b in cell.bases.iter() {
        if full(upd) {
            break;
        }
        let base = &galaxy.bases[b];
        upd.objects.push(NetObject {
            x: base.pos.x as f32,
            y: base.pos.y as f32,
            z: base.pos.z as f32,
            kind: kind::BASE,
            active: 1,
            health_pct: 100,
            id: base.id + id::BASE_BASE,
            name: "Starbase".to_string(),
            ..NetObject::default()
        });
    }
    for n in cell.nebulas.iter() {
        if full(upd) {
            break;
        }
        let nebula = &galaxy.nebulas[n];
        upd.objects.push(NetObject {
            x: nebula.pos.x as f32,
            y: nebula.pos.y as f32,
            z: nebula.pos.z as f32,
            kind: kind::NEBULA,
            ship_class: nebula.id % 5,
            active: 1,
            health_pct: 100,
            id: nebula.id + id::NEBULA_BASE,
            name: "Nebula".to_string(),
            ..NetObject::default()
        });
    }
    for p in cell.pulsars.iter() {
        if full(upd) {
            break;
        }
        let pulsar = &galaxy.pulsars[p];
        upd.objects.push(NetObject {
            x: pulsar.pos.x as f32,
            y: pulsar.pos.y as f32,
            z: pulsar.pos.z as f32,
            kind: kind::PULSAR,
            active: 1,
            health_pct: 100,
            id: pulsar.id + id::PULSAR_BASE,
            name: "Pulsar".to_string(),
            ..NetObject::default()
        });
    }
    for c in cell.comets.iter() {
        if full(upd) {
            break;
        }
        let comet = &galaxy.comets[c];
        upd.objects.push(NetObject {
            x: comet.pos.x as f32,
            y: comet.pos.y as f32,
            z: comet.pos.z as f32,
            h: comet.heading as f32,
            m: comet.mark as f32,
            kind: kind::COMET,
            active: 1,
            health_pct: 100,
            id: comet.id + id::COMET_BASE,
            name: "Comet".to_string(),
            ..NetObject::default()
        });
    }
    for a in cell.asteroids.iter() {
        if full(upd) {
            break;
        }
        let asteroid = &galaxy.asteroids[a];
        upd.objects.push(NetObject {
            x: asteroid.pos.x as f32,
            y: asteroid.pos.y as f32,
            z: asteroid.pos.z as f32,
            kind: kind::ASTEROID,
            active: 1,
            health_pct: 100,
            id: asteroid.id + id::ASTEROID_BASE,
            name: "Asteroid".to_string(),
            ..NetObject::default()
        });
    }
    for d in cell.derelicts.iter() {
        if full(upd) {
            break;
        }
        let derelict = &galaxy.derelicts[d];
        upd.objects.push(NetObject {
            x: derelict.pos.x as f32,
            y: derelict.pos.y as f32,
            z: derelict.pos.z as f32,
            kind: kind::DERELICT,
            ship_class: derelict.ship_class,
            active: 1,
            health_pct: 30,
            id: derelict.id + id::DERELICT_BASE,
            name: "Derelict".to_string(),
            ..NetObject::default()
        });
    }
    for pt in cell.platforms.iter() {
        if full(upd) {
            break;
        }
        let platform = &galaxy.platforms[pt];
        upd.objects.push(NetObject {
            x: platform.pos.x as f32,
            y: platform.pos.y as f32,
            z: platform.pos.z as f32,
            kind: kind::PLATFORM,
            active: 1,
            health_pct: (platform.energy as f64 / 10_000.0 * 100.0) as i32,
            id: platform.id + id::PLATFORM_BASE,
            name: "Defense Platform".to_string(),
            ..NetObject::default()
        });
    }
    for mo in cell.monsters.iter() {
        if full(upd) {
            break;
        }
        let monster = &galaxy.monsters[mo];
        upd.objects.push(NetObject {
            x: monster.pos.x as f32,
            y: monster.pos.y as f32,
            z: monster.pos.z as f32,
            kind: monster.kind,
            active: 1,
            health_pct: 100,
            id: monster.id + id::MONSTER_BASE,
            name: species_name(monster.kind).to_string(),
            ..NetObject::default()
        });
    }
}

/// Build a server-originated chat line for one player: signed with the
/// server identity, sealed when the session selected a cipher.
pub fn note_packet(
    galaxy: &Galaxy,
    slot: usize,
    from: &str,
    text: &str,
    master_key: &[u8; 32],
    signing: &SigningKey,
) -> PacketMessage {
    let mut msg = PacketMessage {
        from: from.to_string(),
        origin_frame: galaxy.master.frame_id,
        ..PacketMessage::default()
    };

    msg.has_signature = 1;
    msg.signature = crypto::sign_text(signing, text.as_bytes());
    msg.sender_pubkey = signing.verifying_key().to_bytes();

    seal_for(galaxy, slot, text.as_bytes(), master_key, &mut msg);
    msg
}

/// Fan a player chat message out to its audience, sealing per recipient.
/// Returns `(slot, packet)` pairs for the server to write.
pub fn relay_chat(
    galaxy: &Galaxy,
    msg: &PacketMessage,
    master_key: &[u8; 32],
) -> Vec<(usize, PacketMessage)> {
    let sender_algo = galaxy
        .players
        .iter()
        .find(|p| p.active && p.name == msg.from)
        .map(|p| p.crypto_algo)
        .unwrap_or(CipherAlgo::None);

    let mut out = Vec::new();
    for (slot, player) in galaxy.players.iter().enumerate() {
        if !player.active || !player.connected {
            continue;
        }
        if msg.scope == SCOPE_FACTION && player.faction != msg.faction {
            continue;
        }
        if msg.scope == SCOPE_PRIVATE {
            let is_target = id::player_id(slot) == msg.target_id;
            let is_sender = player.name == msg.from;
            if !is_target && !is_sender {
                continue;
            }
        }

        let mut individual = msg.clone();
        individual.origin_frame = galaxy.master.frame_id;
        if sender_algo != CipherAlgo::None {
            individual.crypto_algo = sender_algo as u8;
            seal_for(galaxy, slot, &msg.text, master_key, &mut individual);
        } else {
            individual.is_encrypted = 0;
        }
        out.push((slot, individual));
    }
    out
}

/// Encrypt `plaintext` into `msg` under a recipient's session cipher, or
/// pass it through in the clear.
fn seal_for(
    galaxy: &Galaxy,
    slot: usize,
    plaintext: &[u8],
    master_key: &[u8; 32],
    msg: &mut PacketMessage,
) {
    let player = &galaxy.players[slot];
    let algo = if msg.crypto_algo != 0 {
        CipherAlgo::from_u8(msg.crypto_algo)
    } else {
        player.crypto_algo
    };

    if algo == CipherAlgo::None || !algo.is_supported() {
        msg.is_encrypted = 0;
        msg.crypto_algo = 0;
        msg.text = plaintext.to_vec();
        return;
    }

    let key = if player.session_key.iter().all(|&b| b == 0) {
        master_key
    } else {
        &player.session_key
    };
    match crypto::seal_message(algo, key, msg.origin_frame, plaintext) {
        Ok(sealed) => {
            msg.is_encrypted = 1;
            msg.crypto_algo = algo as u8;
            msg.iv = sealed.iv;
            msg.tag = sealed.tag;
            msg.text = sealed.ciphertext;
        }
        Err(err) => {
            // Fall back to cleartext rather than dropping the line.
            log::warn!("chat seal failed: {err}");
            msg.is_encrypted = 0;
            msg.crypto_algo = 0;
            msg.text = plaintext.to_vec();
        }
    }
}
