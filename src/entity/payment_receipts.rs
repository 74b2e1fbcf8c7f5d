use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payment_receipts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_payment_id: Uuid,
    pub receipt_url: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order_payments::Entity",
        from = "Column::OrderPaymentId",
        to = "super::order_payments::Column::Id"
    )]
    OrderPayments,
}

impl Related<super::order_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
