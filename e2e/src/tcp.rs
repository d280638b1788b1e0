// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! A TCP binding of the gatehouse `Channel`.
//!
//! The reference deployment listens on a WiFi-attached TCP port; this
//! module is the host-side equivalent. The [`Channel`] contract demands
//! non-blocking, atomic-or-nothing reads, which is implemented here by
//! `peek`ing the socket and only committing to a `read_exact` once every
//! requested byte is already buffered.

use std::io::Read as _;
use std::io::Write as _;
use std::net::TcpListener;
use std::net::TcpStream;

use gatehouse::io;
use gatehouse::net;
use gatehouse::net::Channel;

/// A [`Channel`] over a listening TCP socket.
///
/// One client is served at a time, matching the device's
/// single-session protocol; a new connection replaces a dead one.
pub struct TcpChannel {
    port: u16,
    listener: Option<TcpListener>,
    client: Option<TcpStream>,
}

impl TcpChannel {
    /// Creates a channel that will listen on `port` once opened.
    ///
    /// Port 0 asks the OS for an ephemeral port; see
    /// [`TcpChannel::local_port()`].
    pub fn new(port: u16) -> Self {
        Self {
            port,
            listener: None,
            client: None,
        }
    }

    /// Returns the port actually bound, once the channel is open.
    pub fn local_port(&self) -> Option<u16> {
        let listener = self.listener.as_ref()?;
        listener.local_addr().ok().map(|addr| addr.port())
    }

    /// Accepts a pending connection, if any, and returns the live client.
    fn client(&mut self) -> Option<&mut TcpStream> {
        if self.client.is_none() {
            let listener = self.listener.as_ref()?;
            match listener.accept() {
                Ok((stream, peer)) => {
                    log::info!("client connected: {}", peer);
                    if stream.set_nonblocking(true).is_err() {
                        return None;
                    }
                    self.client = Some(stream);
                }
                Err(_) => return None,
            }
        }
        self.client.as_mut()
    }
}

impl Channel for TcpChannel {
    fn open(&mut self) -> Result<(), net::Error> {
        let listener = TcpListener::bind(("127.0.0.1", self.port))
            .map_err(|e| {
                log::error!("{}", e);
                net::Error::Io(io::Error::Internal)
            })?;
        listener.set_nonblocking(true).map_err(|e| {
            log::error!("{}", e);
            net::Error::Io(io::Error::Internal)
        })?;
        self.listener = Some(listener);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, net::Error> {
        let stream = match self.client() {
            Some(stream) => stream,
            None => return Ok(0),
        };
        if buf.is_empty() {
            return Ok(0);
        }

        match stream.peek(buf) {
            // Everything we want is already buffered; this cannot block.
            Ok(n) if n == buf.len() => match stream.read_exact(buf) {
                Ok(()) => Ok(buf.len()),
                Err(e) => {
                    log::error!("{}", e);
                    self.client = None;
                    Ok(0)
                }
            },
            // A peek of zero bytes is EOF.
            Ok(0) => {
                log::info!("client disconnected");
                self.client = None;
                Ok(0)
            }
            Ok(_) => Ok(0),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => {
                log::error!("{}", e);
                self.client = None;
                Ok(0)
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, net::Error> {
        let stream = match self.client() {
            Some(stream) => stream,
            None => return Ok(0),
        };
        match stream.write_all(buf) {
            Ok(()) => Ok(buf.len()),
            Err(e) => {
                log::error!("{}", e);
                self.client = None;
                Ok(0)
            }
        }
    }
}
