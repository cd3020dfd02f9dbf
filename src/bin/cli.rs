//! EventEase CLI Client
//!
//! Command-line interface for interacting with an EventEase server.

use clap::{Args as ClapArgs, Parser, Subcommand};
use eventease::client::Client;
use eventease::protocol::{Response, Status};
use eventease::ticket::field;
use eventease::Fields;
use serde_json::Value;

/// EventEase CLI
#[derive(Parser, Debug)]
#[command(name = "eventease-cli")]
#[command(about = "CLI for the EventEase ticket service")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a ticket
    Create(TicketFields),

    /// List all tickets
    List,

    /// Get a ticket by id
    Get {
        /// Ticket id
        id: String,
    },

    /// Update fields of a ticket
    Update {
        /// Ticket id
        id: String,

        #[command(flatten)]
        fields: TicketFields,
    },

    /// Delete a ticket
    Delete {
        /// Ticket id
        id: String,
    },

    /// Ping the server
    Ping,
}

#[derive(ClapArgs, Debug)]
struct TicketFields {
    /// Event name
    #[arg(long)]
    event_name: Option<String>,

    /// Ticket price
    #[arg(long)]
    price: Option<f64>,

    /// Buyer
    #[arg(long)]
    buyer: Option<String>,

    /// Extra field as key=value (value parsed as JSON, else taken as a string)
    #[arg(long = "field", value_parser = parse_field)]
    extra: Vec<(String, Value)>,
}

impl TicketFields {
    fn into_fields(self) -> Fields {
        let mut fields = Fields::new();
        for (key, value) in self.extra {
            fields.insert(key, value);
        }
        if let Some(name) = self.event_name {
            fields.insert(field::EVENT_NAME.to_string(), Value::String(name));
        }
        if let Some(price) = self.price {
            fields.insert(field::PRICE.to_string(), Value::from(price));
        }
        if let Some(buyer) = self.buyer {
            fields.insert(field::BUYER.to_string(), Value::String(buyer));
        }
        fields
    }
}

fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn main() {
    let args = Args::parse();

    let mut client = match Client::connect(&args.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(2);
        }
    };

    let result = match args.command {
        Commands::Create(fields) => client.create(&fields.into_fields()),
        Commands::List => client.list(),
        Commands::Get { id } => client.get(&id),
        Commands::Update { id, fields } => client.update(&id, &fields.into_fields()),
        Commands::Delete { id } => client.delete(&id),
        Commands::Ping => client.ping(),
    };

    match result {
        Ok(response) => {
            print_response(&response);
            if response.status != Status::Ok {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Request failed: {}", e);
            std::process::exit(2);
        }
    }
}

fn print_response(response: &Response) {
    let body = match response.json::<Value>() {
        Ok(json) if response.is_ok() => {
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        }
        _ => response.message().unwrap_or_default(),
    };
    println!("{} {}", response.status.http_code(), body);
}
