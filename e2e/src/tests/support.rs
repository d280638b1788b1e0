// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! A remote-control client, built byte-for-byte the way the phone app
//! talks to the real device.

use std::io::Read as _;
use std::io::Write as _;
use std::net::TcpStream;
use std::time::Duration;

use gatehouse::crypto::hmac::EngineExt as _;
use gatehouse::crypto::nonce;
use gatehouse::crypto::soft::Aes128Cbc;
use gatehouse::crypto::soft::HmacSha1;
use gatehouse::protocol::envelope;
use gatehouse::protocol::MAX_TRANSMISSION_SIZE;
use gatehouse::protocol::TOKEN_LEN;

use crate::server::TEST_PSK;

/// A counter-based nonce source for the client's IVs.
///
/// Client IVs only need to be distinct, not secret, for these tests.
struct ClientIvs(u32);

impl nonce::Source for ClientIvs {
    fn next_nonce(
        &mut self,
        out: &mut [u8; nonce::NONCE_LEN],
    ) -> Result<(), nonce::Error> {
        *out = [0xc1; nonce::NONCE_LEN];
        out[..4].copy_from_slice(&self.0.to_le_bytes());
        self.0 += 1;
        Ok(())
    }
}

/// Computes the conversation token for a received challenge.
pub fn token_for(challenge: &[u8]) -> Vec<u8> {
    let mut token = [0; TOKEN_LEN];
    HmacSha1::new()
        .contiguous_hmac(TEST_PSK.as_bytes(), challenge, &mut token)
        .unwrap();
    token.to_vec()
}

/// A connected client.
pub struct Client {
    stream: TcpStream,
    ivs: ClientIvs,
}

impl Client {
    /// Connects to a server on localhost.
    pub fn connect(port: u16) -> Self {
        let stream = TcpStream::connect(("127.0.0.1", port))
            .expect("failed to connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream.set_nodelay(true).unwrap();
        Self {
            stream,
            ivs: ClientIvs(0),
        }
    }

    /// Seals `payload` into a transmission.
    pub fn seal(&mut self, payload: &[u8]) -> Vec<u8> {
        let mut out = [0; MAX_TRANSMISSION_SIZE];
        let len = envelope::seal(
            payload,
            &TEST_PSK,
            &mut self.ivs,
            &mut Aes128Cbc,
            &mut HmacSha1::new(),
            &mut out,
        )
        .unwrap();
        out[..len].to_vec()
    }

    /// Sends raw transmission bytes.
    pub fn send_raw(&mut self, frame: &[u8]) {
        self.stream.write_all(frame).expect("failed to send");
    }

    /// Receives one transmission and opens it.
    pub fn recv(&mut self) -> Vec<u8> {
        let mut length_bytes = [0; 2];
        self.stream
            .read_exact(&mut length_bytes)
            .expect("no reply from server");
        let length = u16::from_le_bytes(length_bytes) as usize;

        let mut frame = vec![0; length];
        frame[..2].copy_from_slice(&length_bytes);
        self.stream
            .read_exact(&mut frame[2..])
            .expect("truncated reply from server");

        envelope::open(
            &mut frame,
            &TEST_PSK,
            &mut Aes128Cbc,
            &mut HmacSha1::new(),
        )
        .expect("reply failed to open")
        .to_vec()
    }

    /// Seals and sends `payload`, then receives and opens the reply.
    pub fn transact(&mut self, payload: &[u8]) -> Vec<u8> {
        let frame = self.seal(payload);
        self.send_raw(&frame);
        self.recv()
    }

    /// Asserts that the server stays silent for `window`.
    pub fn expect_silence(&mut self, window: Duration) {
        self.stream.set_read_timeout(Some(window)).unwrap();
        let mut byte = [0; 1];
        match self.stream.read(&mut byte) {
            Ok(0) => panic!("server closed the connection"),
            Ok(_) => panic!("server replied when silence was expected"),
            Err(e) => {
                assert!(
                    matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock
                            | std::io::ErrorKind::TimedOut
                    ),
                    "unexpected error: {}",
                    e
                );
            }
        }
        self.stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
    }
}
