use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::engine::{BookingAuthority, EngineError, Hotel, NightCell, YearMonth};
use crate::model::*;

/// Roster file inside each hotel folder.
pub const ROSTER_FILE: &str = "hotel_info.txt";

fn corrupt(source: impl std::fmt::Display, msg: impl std::fmt::Display) -> EngineError {
    EngineError::Storage(format!("{source}: {msg}"))
}

// ── Roster ───────────────────────────────────────────────────────

/// Hotel name on the first line, then `Room <num>,<Type>,<price>` per room.
pub fn encode_roster(hotel: &Hotel) -> String {
    let mut out = String::new();
    out.push_str(hotel.name());
    out.push('\n');
    for room in hotel.rooms() {
        out.push_str(&room.to_string());
        out.push('\n');
    }
    out
}

pub fn decode_roster(text: &str) -> Result<(String, Vec<Room>), EngineError> {
    let mut lines = text.lines().map(|l| l.trim_end_matches('\r'));
    let name = lines
        .next()
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| corrupt(ROSTER_FILE, "missing hotel name"))?
        .to_string();

    let mut rooms = Vec::new();
    for (idx, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 2;
        let room = decode_room_line(line)
            .map_err(|e| corrupt(format_args!("{ROSTER_FILE} line {line_no}"), e))?;
        rooms.push(room);
    }
    Ok((name, rooms))
}

fn decode_room_line(line: &str) -> Result<Room, EngineError> {
    let mut fields = line.split(',');
    let (Some(label), Some(room_type), Some(price), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(EngineError::InvalidInput(format!("expected 3 fields in {line:?}")));
    };
    let room_num = label
        .trim()
        .strip_prefix("Room")
        .map(str::trim)
        .and_then(|n| n.parse::<i64>().ok())
        .ok_or_else(|| EngineError::InvalidInput(format!("bad room label {label:?}")))?;
    let room_type: RoomType = room_type.parse()?;
    let price = price
        .trim()
        .parse::<f64>()
        .map_err(|_| EngineError::InvalidInput(format!("bad price {price:?}")))?;
    Room::new(room_type, room_num, price)
}

// ── Monthly occupancy ────────────────────────────────────────────

/// `<year>_<Mon>.csv`, e.g. `2021_Oct.csv`.
pub fn occupancy_file_name(year: i32, month: u32) -> Option<String> {
    month_abbreviation(month).map(|m| format!("{year}_{m}.csv"))
}

pub fn parse_occupancy_file_name(file_name: &str) -> Option<YearMonth> {
    let stem = file_name.strip_suffix(".csv")?;
    let (year, month) = stem.split_once('_')?;
    Some((year.parse().ok()?, month_from_abbreviation(month)?))
}

/// One line per room: the room number, then one cell per day of the month.
/// Occupied nights repeat the owning reservation's short form; free nights
/// are empty.
pub fn encode_month(hotel: &Hotel, year: i32, month: u32) -> String {
    let mut owner: HashMap<(u32, NaiveDate), String> = HashMap::new();
    for reservation in hotel.reservations_in_month(year, month) {
        let short = reservation.to_short_form();
        for night in reservation.stay().iter_nights() {
            owner.insert((reservation.room_num(), night), short.clone());
        }
    }

    let days = days_in_month(year, month);
    let mut out = String::new();
    for room in hotel.rooms() {
        out.push_str(&room.room_num.to_string());
        for day in 1..=days {
            out.push(',');
            let Some(night) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };
            if !room.calendar.is_occupied(night) {
                continue;
            }
            match owner.get(&(room.room_num, night)) {
                Some(short) => out.push_str(short),
                None => warn!(
                    hotel = %hotel.name(),
                    room = room.room_num,
                    %night,
                    "occupied night has no reservation; writing it as free"
                ),
            }
        }
        out.push('\n');
    }
    out
}

/// Parse a month file into per-room night cells.
pub fn decode_month(text: &str, year: i32, month: u32) -> Result<Vec<(u32, Vec<NightCell>)>, EngineError> {
    let source = occupancy_file_name(year, month).unwrap_or_else(|| format!("{year}_{month}"));
    let days = days_in_month(year, month) as usize;
    let mut rows = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let mut fields = line.split(',');
        let room_num = fields
            .next()
            .and_then(|f| f.trim().parse::<u32>().ok())
            .ok_or_else(|| corrupt(format_args!("{source} line {line_no}"), "bad room number"))?;
        let cells: Vec<&str> = fields.collect();
        if cells.len() != days {
            return Err(corrupt(
                format_args!("{source} line {line_no}"),
                format_args!("expected {days} day cells, found {}", cells.len()),
            ));
        }
        let cells = cells
            .into_iter()
            .enumerate()
            .filter_map(|(i, text)| {
                NaiveDate::from_ymd_opt(year, month, i as u32 + 1).map(|date| NightCell {
                    date,
                    text: text.to_string(),
                })
            })
            .collect();
        rows.push((room_num, cells));
    }
    Ok(rows)
}

// ── Files ────────────────────────────────────────────────────────

/// Write to a temp sibling, fsync, then rename over `path`.
fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    let file = File::create(&tmp_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(contents.as_bytes())?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    fs::rename(&tmp_path, path)
}

/// Occupancy files currently present in a hotel folder. A `.csv` whose name
/// is not `<year>_<Mon>.csv` is corrupt.
fn occupancy_files(folder: &Path) -> Result<BTreeMap<YearMonth, PathBuf>, EngineError> {
    let mut found = BTreeMap::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str().filter(|n| n.ends_with(".csv")) else {
            continue;
        };
        let ym = parse_occupancy_file_name(file_name)
            .ok_or_else(|| corrupt(entry.path().display(), "unrecognised occupancy file name"))?;
        found.insert(ym, entry.path());
    }
    Ok(found)
}

/// Write the roster and one file per occupied month under
/// `data_dir/<folder_name>/`. Month files that no longer hold any occupied
/// night are removed. Returns the hotel folder.
pub fn save_hotel(hotel: &Hotel, data_dir: &Path) -> Result<PathBuf, EngineError> {
    let folder = data_dir.join(hotel.folder_name());
    fs::create_dir_all(&folder)?;

    write_atomic(&folder.join(ROSTER_FILE), &encode_roster(hotel))?;

    let months: BTreeSet<YearMonth> = hotel.occupied_months();
    for &(year, month) in &months {
        let Some(file_name) = occupancy_file_name(year, month) else {
            continue;
        };
        write_atomic(&folder.join(file_name), &encode_month(hotel, year, month))?;
    }

    for (ym, path) in occupancy_files(&folder)? {
        if !months.contains(&ym) {
            fs::remove_file(&path)?;
            info!(hotel = %hotel.name(), file = %path.display(), "removed empty occupancy file");
        }
    }

    debug!(hotel = %hotel.name(), months = months.len(), "hotel saved");
    Ok(folder)
}

/// Rebuild a hotel from its folder. Every room is provisioned for every month
/// that has a file, then each booked night is replayed through the normal
/// reservation path, registering booking numbers with `authority`.
pub fn load_hotel(folder: &Path, authority: &BookingAuthority) -> Result<Hotel, EngineError> {
    let roster_path = folder.join(ROSTER_FILE);
    let roster = fs::read_to_string(&roster_path)
        .map_err(|e| corrupt(roster_path.display(), e))?;
    let (name, mut rooms) = decode_roster(&roster)?;

    let files = occupancy_files(folder)?;
    let months: Vec<YearMonth> = files.keys().copied().collect();
    for room in &mut rooms {
        room.calendar.provision(months.iter().copied());
    }

    let mut hotel = Hotel::new(name, rooms).map_err(|e| corrupt(roster_path.display(), e))?;

    let mut cells_by_room: BTreeMap<u32, Vec<NightCell>> = BTreeMap::new();
    for (&(year, month), path) in &files {
        let text = fs::read_to_string(path).map_err(|e| corrupt(path.display(), e))?;
        for (room_num, cells) in decode_month(&text, year, month)? {
            if hotel.room(room_num).is_none() {
                return Err(corrupt(path.display(), format_args!("unknown room {room_num}")));
            }
            cells_by_room.entry(room_num).or_default().extend(cells);
        }
    }

    for (room_num, cells) in &cells_by_room {
        hotel
            .restore_room_reservations(*room_num, cells, authority)
            .map_err(|e| corrupt(folder.display(), format_args!("room {room_num}: {e}")))?;
    }

    info!(
        hotel = %hotel.name(),
        rooms = hotel.rooms().len(),
        reservations = hotel.reservation_count(),
        months = files.len(),
        "hotel loaded"
    );
    Ok(hotel)
}
