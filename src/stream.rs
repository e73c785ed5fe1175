//! 播放链接解析

use crate::types::{StreamInfo, VideoPath};
use crate::upstream::DramaSource;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Link streaming tidak ditemukan")]
    NotFound,
    #[error("Gagal mengambil link streaming")]
    Failed,
}

/// 解析某一集的播放地址
///
/// 取第一个章节的第一个 CDN, 上游错误细节只写日志, 不返回给调用方。
pub async fn resolve_stream(
    source: &dyn DramaSource,
    book_id: &str,
    episode: u32,
) -> Result<StreamInfo, StreamError> {
    let batch = source.chapters(book_id, episode).await.map_err(|e| {
        warn!("获取播放链接失败 {} 第 {} 集: {}", book_id, episode, e);
        StreamError::Failed
    })?;

    let cdn = batch
        .chapter_list
        .into_iter()
        .next()
        .and_then(|chapter| chapter.cdn_list.into_iter().next())
        .ok_or(StreamError::NotFound)?;

    let url = select_video_path(&cdn.video_path_list)
        .map(|v| v.video_path.clone())
        .unwrap_or_default();

    Ok(StreamInfo {
        url,
        title: format!("Episode {}", episode),
        duration: 0,
        episode_number: episode,
        qualities: cdn.video_path_list,
        cdn_domain: cdn.cdn_domain,
    })
}

/// 清晰度优先级: 720p > 默认 > 540p > 第一个, 没有地址的条目不参与
pub fn select_video_path(paths: &[VideoPath]) -> Option<&VideoPath> {
    let playable = || paths.iter().filter(|v| !v.video_path.is_empty());
    playable()
        .find(|v| v.quality == Some(720))
        .or_else(|| playable().find(|v| v.is_default == Some(1)))
        .or_else(|| playable().find(|v| v.quality == Some(540)))
        .or_else(|| playable().next())
}
