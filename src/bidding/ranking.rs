/// 입찰 순위 계산
/// 금액 오름차순, 같은 금액이면 먼저 들어온 입찰이 앞선다.
use super::model::{Bid, RankedBid};
use std::cmp::Ordering;

fn compare_bids(a: &Bid, b: &Bid) -> Ordering {
    a.amount
        .total_cmp(&b.amount)
        .then_with(|| a.timestamp.cmp(&b.timestamp))
        .then_with(|| a.id.cmp(&b.id))
}

/// 입찰 목록 정렬
pub fn rank_bids(mut bids: Vec<Bid>) -> Vec<Bid> {
    bids.sort_by(compare_bids);
    bids
}

/// 최저 입찰
pub fn lowest_bid(bids: &[Bid]) -> Option<&Bid> {
    bids.iter().min_by(|a, b| compare_bids(a, b))
}

/// 공급사용 익명 순위표. 입력은 이미 정렬되어 있어야 한다.
pub fn anonymize(ranked: &[Bid]) -> Vec<RankedBid> {
    ranked
        .iter()
        .enumerate()
        .map(|(index, bid)| RankedBid {
            id: bid.id,
            rank: index + 1,
            amount: bid.amount,
            timestamp: bid.timestamp,
            is_lowest: index == 0,
        })
        .collect()
}
