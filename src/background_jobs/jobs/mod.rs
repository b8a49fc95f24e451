mod album_retrieval;

pub use album_retrieval::AlbumRetrievalJob;
