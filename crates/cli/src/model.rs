//! Domain objects decoded from the JSON API.
//!
//! Decoding lives entirely on this side of the fetch boundary: the core hands
//! over raw bytes and this module turns them into typed values, so a decode
//! failure can always be reproduced from the cached payload. Album and photo
//! lookups are naive linear scans over in-memory lists; the API is small
//! enough that nothing smarter has ever been needed.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub address: Address,
    pub phone: String,
    pub website: String,
    pub company: Company,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Address {
    pub street: String,
    pub suite: String,
    pub city: String,
    pub zipcode: String,
    pub geo: Geo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geo {
    pub lat: String,
    pub lng: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Company {
    pub name: String,
    #[serde(rename = "catchPhrase")]
    pub catch_phrase: String,
    pub bs: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    #[serde(rename = "userId")]
    pub user_id: u64,
    pub id: u64,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Photo {
    #[serde(rename = "albumId")]
    pub album_id: u64,
    pub id: u64,
    pub title: String,
    pub url: String,
    #[serde(rename = "thumbnailUrl")]
    pub thumbnail_url: String,
}

/// Decode a JSON array payload into a list of domain objects.
pub fn decode_list<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> eyre::Result<Vec<T>> {
    serde_json::from_slice(bytes).map_err(|e| eyre::eyre!("malformed API payload: {e}"))
}

/// Albums belonging to one user.
pub fn albums_for_user(albums: &[Album], user_id: u64) -> Vec<&Album> {
    albums.iter().filter(|a| a.user_id == user_id).collect()
}

/// Photos belonging to one album.
pub fn photos_for_album(photos: &[Photo], album_id: u64) -> Vec<&Photo> {
    photos.iter().filter(|p| p.album_id == album_id).collect()
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) - {}",
            self.name, self.email, self.company.catch_phrase
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USERS_JSON: &str = r#"[{
        "id": 1,
        "name": "Leanne Graham",
        "username": "Bret",
        "email": "Sincere@april.biz",
        "address": {
            "street": "Kulas Light",
            "suite": "Apt. 556",
            "city": "Gwenborough",
            "zipcode": "92998-3874",
            "geo": { "lat": "-37.3159", "lng": "81.1496" }
        },
        "phone": "1-770-736-8031 x56442",
        "website": "hildegard.org",
        "company": {
            "name": "Romaguera-Crona",
            "catchPhrase": "Multi-layered client-server neural-net",
            "bs": "harness real-time e-markets"
        }
    }]"#;

    #[test]
    fn decodes_users_payload() {
        let users: Vec<User> = decode_list(USERS_JSON.as_bytes()).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Leanne Graham");
        assert_eq!(users[0].company.catch_phrase, "Multi-layered client-server neural-net");
        assert_eq!(
            users[0].to_string(),
            "Leanne Graham (Sincere@april.biz) - Multi-layered client-server neural-net"
        );
    }

    #[test]
    fn malformed_payload_is_an_error_not_a_panic() {
        assert!(decode_list::<User>(b"{not json").is_err());
    }

    #[test]
    fn album_and_photo_scans_filter_by_owner() {
        let albums = vec![
            Album { user_id: 1, id: 10, title: "a".into() },
            Album { user_id: 2, id: 11, title: "b".into() },
            Album { user_id: 1, id: 12, title: "c".into() },
        ];
        let mine = albums_for_user(&albums, 1);
        assert_eq!(mine.iter().map(|a| a.id).collect::<Vec<_>>(), vec![10, 12]);

        let photos = vec![
            Photo {
                album_id: 10,
                id: 1,
                title: "p".into(),
                url: "http://host/p1".into(),
                thumbnail_url: "http://host/t1".into(),
            },
            Photo {
                album_id: 11,
                id: 2,
                title: "q".into(),
                url: "http://host/p2".into(),
                thumbnail_url: "http://host/t2".into(),
            },
        ];
        assert_eq!(photos_for_album(&photos, 10).len(), 1);
        assert!(photos_for_album(&photos, 99).is_empty());
    }
}
