//! SQL schema for the Chirp SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS identities (
    identity_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT,
    email          TEXT NOT NULL UNIQUE,
    credential     TEXT NOT NULL,   -- argon2 PHC string
    tweet_rights   INTEGER NOT NULL DEFAULT 0 CHECK (tweet_rights >= 0),
    comment_rights INTEGER NOT NULL DEFAULT 0 CHECK (comment_rights >= 0),
    created_at     TEXT NOT NULL    -- ISO 8601 UTC
);

CREATE TABLE IF NOT EXISTS topics (
    topic_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name     TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS tweets (
    tweet_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    author_id  INTEGER NOT NULL REFERENCES identities(identity_id),
    topic_id   INTEGER REFERENCES topics(topic_id),
    body       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    tweet_id   INTEGER NOT NULL REFERENCES tweets(tweet_id),
    author_id  INTEGER NOT NULL REFERENCES identities(identity_id),
    body       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS follows (
    follower_id INTEGER NOT NULL REFERENCES identities(identity_id),
    followee_id INTEGER NOT NULL REFERENCES identities(identity_id),
    created_at  TEXT NOT NULL,
    PRIMARY KEY (follower_id, followee_id),
    CHECK (follower_id != followee_id)
);

CREATE TABLE IF NOT EXISTS likes (
    identity_id INTEGER NOT NULL REFERENCES identities(identity_id),
    tweet_id    INTEGER NOT NULL REFERENCES tweets(tweet_id),
    created_at  TEXT NOT NULL,
    PRIMARY KEY (identity_id, tweet_id)
);

-- No uniqueness: selecting the same topic twice records two rows.
CREATE TABLE IF NOT EXISTS topic_selections (
    selection_id INTEGER PRIMARY KEY AUTOINCREMENT,
    identity_id  INTEGER NOT NULL REFERENCES identities(identity_id),
    topic_id     INTEGER NOT NULL REFERENCES topics(topic_id),
    created_at   TEXT NOT NULL
);

-- Append-only.
CREATE TABLE IF NOT EXISTS notifications (
    notification_id INTEGER PRIMARY KEY AUTOINCREMENT,
    identity_id     INTEGER NOT NULL REFERENCES identities(identity_id),
    message         TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS tweets_author_idx        ON tweets(author_id);
CREATE INDEX IF NOT EXISTS tweets_topic_idx         ON tweets(topic_id);
CREATE INDEX IF NOT EXISTS comments_tweet_idx       ON comments(tweet_id);
CREATE INDEX IF NOT EXISTS follows_followee_idx     ON follows(followee_id);
CREATE INDEX IF NOT EXISTS selections_identity_idx  ON topic_selections(identity_id);
CREATE INDEX IF NOT EXISTS notifications_identity_idx ON notifications(identity_id);

PRAGMA user_version = 1;
";
