use rand::Rng;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::define::{C0C1_SIZE, RTMP_VERSION, S0S1S2_SIZE};
use super::error::HandshakeError;

/// The plain (non-encrypted) RTMP handshake (5.2). This is the only
/// handshake real FMLE-style publishers (OBS, ffmpeg) fall back to once they
/// notice the server isn't validating the complex handshake's digest, so
/// there is no point implementing the complex variant for a publish-only
/// server.
///
/// Order of messages:
/// ```text
/// client --C0,C1--> server
/// client <--S0,S1,S2-- server
/// client --C2--> server
/// ```
pub struct HandshakeServer;

impl HandshakeServer {
    /// Runs the handshake to completion against a freshly accepted
    /// connection, before the socket is split for the message pump.
    pub async fn handshake<S>(io: &mut S) -> Result<(), HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut c0c1 = vec![0u8; C0C1_SIZE];
        io.read_exact(&mut c0c1).await?;

        let version = c0c1[0];
        if version != RTMP_VERSION {
            return Err(HandshakeError::UnsupportedVersion(version));
        }

        // S1/S2 are never validated against C1 by this server (real clients
        // don't check S1/S2 content either for the plain handshake), so we
        // can fill the whole S0+S1+S2 blob with random bytes in one shot and
        // only patch the leading version byte.
        let mut s0s1s2 = vec![0u8; S0S1S2_SIZE];
        rand::rng().fill(&mut s0s1s2[..]);
        s0s1s2[0] = RTMP_VERSION;
        io.write_all(&s0s1s2).await?;

        let mut c2 = vec![0u8; super::define::HANDSHAKE_BODY_SIZE];
        io.read_exact(&mut c2).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_with_valid_c0() {
        let (mut client, mut server) = tokio::io::duplex(8192);

        let client_task = tokio::spawn(async move {
            let mut c0c1 = vec![0x03u8];
            c0c1.extend(vec![0xAB; super::super::define::HANDSHAKE_BODY_SIZE]);
            client.write_all(&c0c1).await.unwrap();

            let mut s0s1s2 = vec![0u8; S0S1S2_SIZE];
            client.read_exact(&mut s0s1s2).await.unwrap();
            assert_eq!(s0s1s2[0], 0x03);

            let c2 = vec![0xCDu8; super::super::define::HANDSHAKE_BODY_SIZE];
            client.write_all(&c2).await.unwrap();
        });

        HandshakeServer::handshake(&mut server).await.unwrap();

        client_task.await.unwrap();
    }

    #[tokio::test]
    async fn rejects_wrong_c0_version() {
        let (mut client, mut server) = tokio::io::duplex(8192);

        tokio::spawn(async move {
            let mut c0c1 = vec![0x06u8];
            c0c1.extend(vec![0x00; super::super::define::HANDSHAKE_BODY_SIZE]);
            let _ = client.write_all(&c0c1).await;
        });

        let err = HandshakeServer::handshake(&mut server).await.unwrap_err();
        assert!(matches!(err, HandshakeError::UnsupportedVersion(0x06)));
    }
}
