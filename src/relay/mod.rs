//! Signaling Relay - Store-and-Forward Mailboxen
//!
//! Dieses Modul verwaltet:
//! - In-Memory Mailboxen pro Topic (FIFO, lazy angelegt)
//! - Die HTTP-Oberfläche (POST = einreihen, GET = ältesten Eintrag entnehmen)
//!
//! Der Relay kennt weder Sessions noch Payload-Formate, er ist byte-blind.

mod mailbox;
mod server;

pub use mailbox::RelayState;
pub use server::RelayServer;
