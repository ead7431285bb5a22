//! 値オブジェクト定義
//!
//! 不正な値がドメインに入り込まないよう、生成時にバリデーションを行います。
//! 生成に成功した値オブジェクトは常に不変条件を満たします。

use super::error::ValidationError;

/// ID（RoomId / ClientId）の最大文字数
pub const MAX_ID_LENGTH: usize = 64;

/// メッセージ本文の最大文字数
pub const MAX_BODY_LENGTH: usize = 2000;

fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyIdentifier);
    }
    if value.chars().count() > MAX_ID_LENGTH {
        return Err(ValidationError::IdentifierTooLong {
            max: MAX_ID_LENGTH,
            got: value.chars().count(),
        });
    }
    if value.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(ValidationError::InvalidIdentifier);
    }
    Ok(())
}

/// ルーム ID
///
/// ブロードキャストのスコープを表す識別子。クライアントが URL パスで指定する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    /// 新しい RoomId を作成（バリデーション付き）
    pub fn new(value: String) -> Result<Self, ValidationError> {
        validate_identifier(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// クライアント ID
///
/// 接続クライアントの識別子。ルーム内で接続の同一性を表すキーでもある。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(String);

impl ClientId {
    /// 新しい ClientId を作成（バリデーション付き）
    pub fn new(value: String) -> Result<Self, ValidationError> {
        validate_identifier(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ClientId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// メッセージ本文
///
/// 空文字・空白のみ・最大長超過を拒否する。一度生成された本文は不変。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody(String);

impl MessageBody {
    /// 新しい MessageBody を作成（バリデーション付き）
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        let got = value.chars().count();
        if got > MAX_BODY_LENGTH {
            return Err(ValidationError::BodyTooLong {
                max: MAX_BODY_LENGTH,
                got,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageBody {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// シーケンス番号
///
/// ルームごとに単調増加し、再利用されない。採番は Persistence 層が行う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SequenceNumber(i64);

impl SequenceNumber {
    /// 新しい SequenceNumber を作成（1 以上）
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value < 1 {
            return Err(ValidationError::InvalidSequence(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Unix タイムスタンプ（UTC、ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
