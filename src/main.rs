use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::info;

use innkeeper::codec;
use innkeeper::engine::{validate_booking_number, EngineError};
use innkeeper::limits::MAX_RECEIPT_NUMBERS;
use innkeeper::model::{BookingNumber, RoomType};
use innkeeper::{BookingSystem, Hotel};

const USAGE: &str = "usage: innkeeper <command> [args]

commands:
  hotels
  types   <hotel>
  open    <hotel> <year>
  book    <hotel> <guest> <room-type> <check-in> <check-out>
  cancel  <booking-number>
  show    <booking-number>
  receipt <booking-number>...
  find    <hotel> <guest> <room> <check-in> <check-out>
  import  <roster-file>

dates are YYYY-MM-DD; check-out is the morning the guest leaves";

fn parse_date(s: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date {s:?}: {e}").into())
}

fn parse_number(s: &str) -> Result<BookingNumber, Box<dyn std::error::Error>> {
    let number: BookingNumber = s
        .parse()
        .map_err(|_| EngineError::InvalidBookingNumber(s.to_string()))?;
    validate_booking_number(number)?;
    Ok(number)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("INNKEEPER_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    innkeeper::observability::init(metrics_port)?;

    let data_dir = std::env::var("INNKEEPER_DATA_DIR").unwrap_or_else(|_| "./hotels".into());
    std::fs::create_dir_all(&data_dir)?;
    info!("  data_dir: {data_dir}");

    let system = BookingSystem::load_all(PathBuf::from(&data_dir))?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };
    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();

    let mutated = match (command.as_str(), rest.as_slice()) {
        ("hotels", []) => {
            for name in system.hotel_names() {
                println!("{name}");
            }
            false
        }
        ("types", [hotel]) => {
            for room_type in system.list_hotel_types(hotel)? {
                println!("{room_type}");
            }
            false
        }
        ("open", [hotel, year]) => {
            let year: i32 = year.parse().map_err(|_| format!("invalid year {year:?}"))?;
            let added = system.open_season(hotel, year)?;
            println!("opened {year} at {hotel}: {added} room-months added");
            true
        }
        ("book", [hotel, guest, room_type, check_in, check_out]) => {
            let room_type: RoomType = room_type.parse()?;
            let (check_in, check_out) = (parse_date(check_in)?, parse_date(check_out)?);
            system.open_stay(hotel, check_in, check_out)?;
            let number = system.make_reservation(hotel, guest, room_type, check_in, check_out)?;
            let (_, reservation) = system.get_reservation(number)?;
            println!("{reservation}");
            true
        }
        ("cancel", [number]) => {
            let number = parse_number(number)?;
            match system.cancel_reservation(number) {
                Some((hotel, _)) => {
                    println!("cancelled {number} at {hotel}");
                    true
                }
                None => {
                    println!("no reservation {number}");
                    false
                }
            }
        }
        ("show", [number]) => {
            let (hotel, reservation) = system.get_reservation(parse_number(number)?)?;
            let body = serde_json::json!({
                "hotel": hotel,
                "reservation": reservation,
                "cost": reservation.cost(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            false
        }
        ("receipt", numbers) if !numbers.is_empty() => {
            if numbers.len() > MAX_RECEIPT_NUMBERS {
                return Err(EngineError::LimitExceeded("too many booking numbers in one receipt").into());
            }
            let numbers = numbers
                .iter()
                .map(|n| parse_number(n))
                .collect::<Result<Vec<_>, _>>()?;
            println!("{:.2}", system.get_receipt(&numbers));
            false
        }
        ("find", [hotel, guest, room, check_in, check_out]) => {
            let room: u32 = room.parse().map_err(|_| format!("invalid room number {room:?}"))?;
            match system.find_reservation(hotel, guest, room, parse_date(check_in)?, parse_date(check_out)?)? {
                Some(reservation) => println!("{reservation}"),
                None => println!("no matching reservation"),
            }
            false
        }
        ("import", [roster]) => {
            let text = std::fs::read_to_string(roster)?;
            let (name, rooms) = codec::decode_roster(&text)?;
            let hotel = Hotel::new(name, rooms)?;
            println!("imported {} ({} rooms)", hotel.name(), hotel.rooms().len());
            system.add_hotel(hotel)?;
            true
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    if mutated {
        system.save_all()?;
    }
    Ok(())
}
