use std::io::Write;

use busline_booking::HoldRequest;
use busline_core::PassengerDetails;
use clap::{Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use crate::service::BookingService;

/// Operator tool for the seat inventory and bookings
#[derive(Debug, Parser)]
#[command(name = "busline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply pending database migrations
    Migrate,

    /// Show the seats of a trip
    Seats {
        #[arg(long)]
        trip: Uuid,
        /// Only seats a hold request could take right now
        #[arg(long, conflicts_with = "summary")]
        available: bool,
        /// Occupancy counts instead of the seat list
        #[arg(long)]
        summary: bool,
    },

    /// Hold seats for a user and open a pending booking
    Hold {
        #[arg(long)]
        trip: Uuid,
        #[arg(long)]
        user: Uuid,
        #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
        seats: Vec<u32>,
        /// Total in minor currency units
        #[arg(long)]
        amount: i64,
        #[arg(long)]
        special_requests: Option<String>,
        /// Passenger name per seat, in seat order
        #[arg(long = "passenger")]
        passengers: Vec<String>,
    },

    /// Confirm a pending booking after payment
    Confirm { booking_id: Uuid },

    /// Cancel a confirmed booking
    Cancel {
        booking_id: Uuid,
        #[arg(long)]
        reason: Option<String>,
    },

    /// List bookings, newest first
    Bookings {
        #[arg(long, conflicts_with = "id")]
        user: Option<Uuid>,
        #[arg(long)]
        id: Option<Uuid>,
    },
}

/// Runs one command against the service and prints the result as JSON.
/// `migrate` never reaches here; it only needs the database.
pub async fn run<W: Write>(command: Command, service: &BookingService, out: &mut W) -> anyhow::Result<()> {
    match command {
        Command::Migrate => anyhow::bail!("migrate runs against the database directly"),
        Command::Seats { trip, available, summary } => {
            if summary {
                print_json(out, &service.seat_summary(trip).await?)
            } else if available {
                print_json(out, &service.available_seats(trip).await?)
            } else {
                print_json(out, &service.seat_map(trip).await?)
            }
        }
        Command::Hold { trip, user, seats, amount, special_requests, passengers } => {
            let request = HoldRequest {
                trip_id: trip,
                user_id: user,
                seat_numbers: seats,
                total_amount: amount,
                special_requests,
                passengers: passengers
                    .into_iter()
                    .map(|name| PassengerDetails { name: name.into(), age: None, gender: None })
                    .collect(),
            };
            print_json(out, &service.hold_seats(request).await?)
        }
        Command::Confirm { booking_id } => print_json(out, &service.confirm_booking(booking_id).await?),
        Command::Cancel { booking_id, reason } => {
            print_json(out, &service.cancel_booking(booking_id, reason).await?)
        }
        Command::Bookings { user, id } => match (id, user) {
            (Some(id), _) => print_json(out, &service.booking(id).await?),
            (None, Some(user)) => print_json(out, &service.user_bookings(user).await?),
            (None, None) => print_json(out, &service.all_bookings().await?),
        },
    }
}

fn print_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
