//! 원격 소스: 세션 풀과 커넥터
//!
//! [`SessionPool`]은 프로세스 전역 연결 캐시를 명시적인 객체로 만든 것입니다.
//! 사이클 호출자가 소유하고 [`CycleAggregator`](crate::cycle::CycleAggregator)에 주입합니다.
//!
//! 연결 수립과 인증은 [`Connector`] trait 뒤에 있습니다. SFTP 구현은
//! `sftp` feature로 활성화되는 [`SftpConnector`]입니다.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tailguard_core::config::RemoteHostConfig;
use tracing::{debug, info};

use super::SourceReader;
use crate::error::ScannerError;

#[cfg(feature = "sftp")]
pub use sftp::SftpConnector;

/// 원격 호스트 연결 수립
pub trait Connector: Send + Sync {
    /// 인증된 세션을 열고 해당 호스트의 리더를 반환합니다.
    fn connect(&self, host: &RemoteHostConfig) -> Result<Arc<dyn SourceReader>, ScannerError>;
}

/// 원격 세션 캐시
///
/// `host:port:username` 키로 세션을 재사용합니다. 읽기에 실패한 호스트는
/// [`evict`](Self::evict)로 제거되어 다음 사이클에 다시 연결합니다.
pub struct SessionPool {
    connector: Box<dyn Connector>,
    sessions: Mutex<HashMap<String, Arc<dyn SourceReader>>>,
}

impl SessionPool {
    /// 커넥터로 새 풀을 생성합니다.
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// 호스트의 세션을 가져오고, 없으면 새로 연결합니다.
    pub fn acquire(&self, host: &RemoteHostConfig) -> Result<Arc<dyn SourceReader>, ScannerError> {
        let key = host.session_key();
        if let Some(reader) = self.lock().get(&key) {
            return Ok(Arc::clone(reader));
        }

        // 핸드셰이크 동안 잠금을 잡지 않음
        let reader = self.connector.connect(host)?;
        debug!(session = %key, "opened remote session");
        self.lock().insert(key, Arc::clone(&reader));
        Ok(reader)
    }

    /// 호스트의 세션을 캐시에서 제거합니다.
    pub fn evict(&self, host: &RemoteHostConfig) -> bool {
        let removed = self.lock().remove(&host.session_key()).is_some();
        if removed {
            debug!(session = %host.session_key(), "evicted remote session");
        }
        removed
    }

    /// 모든 세션을 닫습니다. 닫은 세션 수를 반환합니다.
    pub fn release_all(&self) -> usize {
        let drained: Vec<_> = self.lock().drain().collect();
        let count = drained.len();
        drop(drained);
        if count > 0 {
            info!(count, "released remote sessions");
        }
        count
    }

    /// 캐시된 세션 수
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// 캐시가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn SourceReader>>> {
        // 캐시 내용은 항상 일관적이므로 poison 상태에서도 계속 사용
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for SessionPool {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(feature = "sftp")]
mod sftp {
    use std::io;
    use std::net::{TcpStream, ToSocketAddrs};
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use ssh2::{Session, Sftp};
    use tailguard_core::config::RemoteHostConfig;
    use tailguard_core::types::SourceMetadata;

    use super::Connector;
    use crate::error::ScannerError;
    use crate::source::{SeekRead, SourceReader};

    /// SSH/SFTP 커넥터
    ///
    /// 키 파일, 비밀번호, ssh-agent 순서로 인증을 시도합니다.
    /// 읽기 타임아웃은 세션 블로킹 타임아웃으로 적용되어 멈춘 읽기가
    /// I/O 에러로 드러납니다.
    #[derive(Debug, Clone)]
    pub struct SftpConnector {
        timeout: Duration,
    }

    impl SftpConnector {
        /// 읽기 타임아웃으로 커넥터를 생성합니다.
        pub fn new(timeout: Duration) -> Self {
            Self { timeout }
        }

        fn open_session(&self, host: &RemoteHostConfig) -> Result<Session, String> {
            let addr = (host.host.as_str(), host.port)
                .to_socket_addrs()
                .map_err(|e| format!("address resolution failed: {e}"))?
                .next()
                .ok_or_else(|| "address resolved to nothing".to_owned())?;

            let tcp = TcpStream::connect_timeout(&addr, self.timeout)
                .map_err(|e| format!("tcp connect failed: {e}"))?;
            tcp.set_read_timeout(Some(self.timeout))
                .map_err(|e| e.to_string())?;

            let mut session = Session::new().map_err(|e| e.to_string())?;
            session.set_tcp_stream(tcp);
            session.set_timeout(u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX));
            session
                .handshake()
                .map_err(|e| format!("handshake failed: {e}"))?;

            let auth = if let Some(ref key) = host.key_filename {
                session.userauth_pubkey_file(
                    &host.username,
                    None,
                    Path::new(key),
                    host.password.as_deref(),
                )
            } else if let Some(ref password) = host.password {
                session.userauth_password(&host.username, password)
            } else {
                session.userauth_agent(&host.username)
            };
            auth.map_err(|e| format!("authentication failed: {e}"))?;

            if !session.authenticated() {
                return Err("authentication rejected".to_owned());
            }
            Ok(session)
        }
    }

    impl Connector for SftpConnector {
        fn connect(
            &self,
            host: &RemoteHostConfig,
        ) -> Result<Arc<dyn SourceReader>, ScannerError> {
            let connection_err = |reason: String| ScannerError::Connection {
                host: host.label(),
                reason,
            };

            let session = self.open_session(host).map_err(connection_err)?;
            let sftp = session
                .sftp()
                .map_err(|e| connection_err(format!("sftp subsystem failed: {e}")))?;

            Ok(Arc::new(SftpReader {
                label: host.label(),
                session,
                sftp,
            }))
        }
    }

    struct SftpReader {
        label: String,
        session: Session,
        sftp: Sftp,
    }

    impl SourceReader for SftpReader {
        fn host_label(&self) -> &str {
            &self.label
        }

        fn stat(&self, path: &str) -> io::Result<SourceMetadata> {
            let stat = self.sftp.stat(Path::new(path))?;
            Ok(SourceMetadata {
                size: stat.size.unwrap_or(0),
                mtime: stat.mtime.unwrap_or(0) as f64,
            })
        }

        fn open(&self, path: &str) -> io::Result<Box<dyn SeekRead>> {
            Ok(Box::new(self.sftp.open(Path::new(path))?))
        }

        fn is_dir(&self, path: &str) -> io::Result<bool> {
            Ok(self.sftp.stat(Path::new(path))?.is_dir())
        }

        fn list_dir(&self, path: &str) -> io::Result<Vec<String>> {
            let mut files: Vec<String> = self
                .sftp
                .readdir(Path::new(path))?
                .into_iter()
                .filter(|(_, stat)| stat.is_file())
                .map(|(p, _)| p.display().to_string())
                .collect();
            files.sort();
            Ok(files)
        }
    }

    impl Drop for SftpReader {
        fn drop(&mut self) {
            let _ = self.session.disconnect(None, "tailguard shutdown", None);
        }
    }
}
