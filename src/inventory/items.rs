//! 库存物品存储
//!
//! 所有物品保存在一个 `watch` 通道中，写入后订阅者收到新快照。
//! 查询视图在读取时按过滤条件和名称排序生成结果。

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// 表示不过滤的分类名称
pub const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// 为 0 时插入会自动分配
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub quantity: i64,
}

impl Item {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        price: f64,
        quantity: i64,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            category: category.into(),
            price,
            quantity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ItemFilter {
    #[default]
    All,
    Category(String),
}

impl ItemFilter {
    /// `"All"` 表示全部分类
    pub fn from_category(category: &str) -> Self {
        if category == ALL_CATEGORIES {
            ItemFilter::All
        } else {
            ItemFilter::Category(category.to_string())
        }
    }

    fn matches(&self, item: &Item) -> bool {
        match self {
            ItemFilter::All => true,
            ItemFilter::Category(category) => &item.category == category,
        }
    }
}

#[derive(Debug)]
struct ItemTable {
    items: Vec<Item>,
    next_id: i64,
}

impl ItemTable {
    fn select(&self, filter: &ItemFilter) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .items
            .iter()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        items
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }
}

/// 物品列表的实时视图
pub struct ItemsView {
    rx: watch::Receiver<ItemTable>,
    filter: ItemFilter,
}

impl ItemsView {
    /// 当前快照，并将其标记为已读
    pub fn current(&mut self) -> Vec<Item> {
        self.rx.borrow_and_update().select(&self.filter)
    }

    /// 等待下一次写入后返回新快照，存储被释放时返回 `None`
    pub async fn next(&mut self) -> Option<Vec<Item>> {
        self.rx.changed().await.ok()?;
        Some(self.current())
    }
}

/// 单个物品的实时视图
pub struct ItemView {
    rx: watch::Receiver<ItemTable>,
    id: i64,
}

impl ItemView {
    pub fn current(&mut self) -> Option<Item> {
        let table = self.rx.borrow_and_update();
        let item = table.position(self.id).map(|i| table.items[i].clone());
        item
    }

    pub async fn next(&mut self) -> Option<Option<Item>> {
        self.rx.changed().await.ok()?;
        Some(self.current())
    }
}

#[derive(Clone)]
pub struct ItemStore {
    tx: Arc<watch::Sender<ItemTable>>,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ItemTable {
            items: Vec::new(),
            next_id: 1,
        });
        Self { tx: Arc::new(tx) }
    }

    /// 按名称排序的全部物品
    pub fn all_items(&self) -> Vec<Item> {
        self.tx.borrow().select(&ItemFilter::All)
    }

    pub fn items_by_category(&self, category: &str) -> Vec<Item> {
        self.tx.borrow().select(&ItemFilter::from_category(category))
    }

    pub fn item(&self, id: i64) -> Option<Item> {
        let table = self.tx.borrow();
        let item = table.position(id).map(|i| table.items[i].clone());
        item
    }

    pub fn watch_items(&self, filter: ItemFilter) -> ItemsView {
        ItemsView {
            rx: self.tx.subscribe(),
            filter,
        }
    }

    pub fn watch_item(&self, id: i64) -> ItemView {
        ItemView {
            rx: self.tx.subscribe(),
            id,
        }
    }

    /// 插入物品，id 冲突时忽略。返回插入后的 id，被忽略时返回 `None`
    pub async fn insert(&self, mut item: Item) -> Option<i64> {
        let mut inserted = None;
        self.tx.send_if_modified(|table| {
            if item.id == 0 {
                item.id = table.next_id;
            }
            if table.position(item.id).is_some() {
                return false;
            }
            table.next_id = table.next_id.max(item.id.saturating_add(1));
            inserted = Some(item.id);
            table.items.push(item);
            true
        });
        inserted
    }

    /// 按 id 整体替换，返回是否找到
    pub async fn update(&self, item: Item) -> bool {
        self.tx.send_if_modified(|table| match table.position(item.id) {
            Some(i) => {
                table.items[i] = item;
                true
            }
            None => false,
        })
    }

    pub async fn delete(&self, id: i64) -> bool {
        self.tx.send_if_modified(|table| match table.position(id) {
            Some(i) => {
                table.items.remove(i);
                true
            }
            None => false,
        })
    }
}
