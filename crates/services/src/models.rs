//! Response models.

use serde::{Deserialize, Serialize};

/// A stored file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub bucket_id: String,
    #[serde(rename = "$createdAt", default)]
    pub created_at: String,
    #[serde(rename = "$updatedAt", default)]
    pub updated_at: String,
    #[serde(rename = "$permissions", default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size_original: u64,
    #[serde(default)]
    pub chunks_total: u64,
    #[serde(default)]
    pub chunks_uploaded: u64,
}

impl File {
    /// Returns `true` once every chunk has been received.
    pub fn is_complete(&self) -> bool {
        self.chunks_total > 0 && self.chunks_uploaded >= self.chunks_total
    }
}

/// A page of files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileList {
    pub total: u64,
    #[serde(default)]
    pub files: Vec<File>,
}

/// A function deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt", default)]
    pub created_at: String,
    #[serde(rename = "$updatedAt", default)]
    pub updated_at: String,
    #[serde(default)]
    pub resource_id: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub entrypoint: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub build_id: String,
    #[serde(default)]
    pub activate: bool,
    /// `waiting`, `processing`, `building`, `ready` or `failed`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub chunks_total: u64,
    #[serde(default)]
    pub chunks_uploaded: u64,
}

/// A page of deployments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentList {
    pub total: u64,
    #[serde(default)]
    pub deployments: Vec<Deployment>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_from_server_json() {
        let file: File = serde_json::from_value(json!({
            "$id": "f1",
            "bucketId": "b1",
            "$createdAt": "2024-01-01T00:00:00.000+00:00",
            "$updatedAt": "2024-01-01T00:00:00.000+00:00",
            "$permissions": ["read(\"any\")"],
            "name": "photo.jpg",
            "signature": "abc",
            "mimeType": "image/jpeg",
            "sizeOriginal": 12000000,
            "chunksTotal": 3,
            "chunksUploaded": 3
        }))
        .unwrap();
        assert_eq!(file.id, "f1");
        assert_eq!(file.bucket_id, "b1");
        assert_eq!(file.mime_type, "image/jpeg");
        assert_eq!(file.size_original, 12_000_000);
        assert!(file.is_complete());
    }

    #[test]
    fn partial_file_is_not_complete() {
        let file: File =
            serde_json::from_value(json!({"$id": "f", "chunksTotal": 3, "chunksUploaded": 1}))
                .unwrap();
        assert!(!file.is_complete());
        assert!(file.permissions.is_empty());
    }

    #[test]
    fn deployment_from_server_json() {
        let d: Deployment = serde_json::from_value(json!({
            "$id": "d1",
            "resourceId": "fn1",
            "resourceType": "functions",
            "entrypoint": "index.js",
            "size": 2048,
            "activate": true,
            "status": "processing"
        }))
        .unwrap();
        assert_eq!(d.resource_id, "fn1");
        assert!(d.activate);
        assert_eq!(d.chunks_total, 0);
    }

    #[test]
    fn lists_default_items() {
        let list: FileList = serde_json::from_value(json!({"total": 0})).unwrap();
        assert!(list.files.is_empty());
        let list: DeploymentList =
            serde_json::from_value(json!({"total": 1, "deployments": [{"$id": "d"}]})).unwrap();
        assert_eq!(list.deployments[0].id, "d");
    }
}
